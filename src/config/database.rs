//! Database configuration module for the mindful shopping tracker.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust structs.

use crate::entities::{Achievement, CustomQuestion, Folder, Item, Review};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use std::path::Path;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/mindful_cart.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable, or the
/// default local `SQLite` file when it is not set.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// File path of a `sqlite://` URL, without its query string.
fn sqlite_file_path(url: &str) -> Option<&Path> {
    let rest = url.strip_prefix("sqlite://")?;
    let path = rest.split('?').next()?;
    (!path.is_empty() && path != ":memory:").then(|| Path::new(path))
}

/// Establishes a connection to the database named by [`get_database_url`].
///
/// For a `SQLite` file the parent directory is created first.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let url = get_database_url();
    if let Some(dir) = sqlite_file_path(&url)
        .and_then(Path::parent)
        .filter(|dir| !dir.as_os_str().is_empty())
    {
        std::fs::create_dir_all(dir)?;
    }

    tracing::info!("Connecting to database at {url}");
    Database::connect(&url).await.map_err(Into::into)
}

/// Creates every table the application needs, skipping the ones that already exist.
///
/// Tables are created parents first so foreign keys always point at an existing table.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let tables = [
        schema.create_table_from_entity(Folder),
        schema.create_table_from_entity(Item),
        schema.create_table_from_entity(Review),
        schema.create_table_from_entity(CustomQuestion),
        schema.create_table_from_entity(Achievement),
    ];

    for mut table in tables {
        table.if_not_exists();
        db.execute(builder.build(&table)).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        AchievementModel, CustomQuestionModel, FolderModel, ItemModel, ReviewModel,
    };
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<FolderModel> = Folder::find().limit(1).all(&db).await?;
        let _: Vec<ItemModel> = Item::find().limit(1).all(&db).await?;
        let _: Vec<ReviewModel> = Review::find().limit(1).all(&db).await?;
        let _: Vec<CustomQuestionModel> = CustomQuestion::find().limit(1).all(&db).await?;
        let _: Vec<AchievementModel> = Achievement::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[test]
    fn test_sqlite_file_path() {
        assert_eq!(
            sqlite_file_path(DEFAULT_DATABASE_URL),
            Some(Path::new("data/mindful_cart.sqlite"))
        );
        assert_eq!(sqlite_file_path("sqlite::memory:"), None);
        assert_eq!(sqlite_file_path("postgres://localhost/cart"), None);
    }

    #[tokio::test]
    async fn test_create_tables_is_repeatable() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;

        let _: Vec<ItemModel> = Item::find().limit(1).all(&db).await?;
        Ok(())
    }
}
