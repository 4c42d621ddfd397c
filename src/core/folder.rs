//! Folder business logic - Named, colored groupings of a user's items.
//!
//! Folders are plain `SeaORM` records; the number of active items in each
//! folder is counted on read.

use crate::{
    entities::{Folder, FolderModel, Item, folder, item},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Serialize;
use tracing::info;

/// Color given to folders created without one
pub const DEFAULT_FOLDER_COLOR: &str = "#6366F1";

/// Folders every new user starts with
pub const DEFAULT_FOLDERS: [(&str, &str); 4] = [
    ("Electronics", "#6366F1"),
    ("Home & Garden", "#10B981"),
    ("Clothing", "#EC4899"),
    ("Books", "#F59E0B"),
];

/// A folder together with its number of active items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderWithCount {
    /// The folder
    #[serde(flatten)]
    pub folder: FolderModel,
    /// Active items filed in the folder
    pub item_count: u64,
}

fn validate_folder_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation {
            message: "Folder name cannot be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Accepts `#RGB` and `#RRGGBB`, normalised to upper case.
fn validate_color(color: &str) -> Result<String> {
    let color = color.trim();
    let valid = color
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()));
    if !valid {
        return Err(Error::Validation {
            message: format!("'{color}' is not a hex color"),
        });
    }
    Ok(color.to_ascii_uppercase())
}

/// Retrieves a user's folders in creation order.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_folders(db: &DatabaseConnection, user_id: &str) -> Result<Vec<FolderModel>> {
    Folder::find()
        .filter(folder::Column::UserId.eq(user_id))
        .order_by_asc(folder::Column::CreatedAt)
        .order_by_asc(folder::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one folder of a user.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_folder(
    db: &DatabaseConnection,
    user_id: &str,
    folder_id: i64,
) -> Result<Option<FolderModel>> {
    Folder::find_by_id(folder_id)
        .filter(folder::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a user's folders with the number of active items in each.
///
/// # Errors
/// Returns an error if a database query fails.
pub async fn get_folders_with_counts(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Vec<FolderWithCount>> {
    let folders = get_folders(db, user_id).await?;
    let mut result = Vec::with_capacity(folders.len());
    for folder in folders {
        let item_count = Item::find()
            .filter(item::Column::UserId.eq(user_id))
            .filter(item::Column::FolderId.eq(folder.id))
            .filter(item::Column::IsArchived.eq(false))
            .count(db)
            .await?;
        result.push(FolderWithCount { folder, item_count });
    }
    Ok(result)
}

/// Creates a folder, falling back to [`DEFAULT_FOLDER_COLOR`].
///
/// # Errors
/// Returns an error if:
/// - The name is empty or whitespace-only
/// - The color is not a `#RGB` / `#RRGGBB` hex value
/// - The database insert fails
pub async fn create_folder(
    db: &DatabaseConnection,
    user_id: &str,
    name: &str,
    color: Option<&str>,
    now: DateTime<Utc>,
) -> Result<FolderModel> {
    let name = validate_folder_name(name)?;
    let color = validate_color(color.unwrap_or(DEFAULT_FOLDER_COLOR))?;

    let folder = folder::ActiveModel {
        user_id: Set(user_id.to_string()),
        name: Set(name),
        color: Set(color),
        created_at: Set(now),
        ..Default::default()
    };
    folder.insert(db).await.map_err(Into::into)
}

/// Renames and/or recolors a folder. `None` leaves a field as it is.
///
/// # Errors
/// Returns an error if a new value is invalid or the database update fails.
pub async fn update_folder(
    db: &DatabaseConnection,
    user_id: &str,
    folder_id: i64,
    name: Option<&str>,
    color: Option<&str>,
) -> Result<Option<FolderModel>> {
    let name = name.map(validate_folder_name).transpose()?;
    let color = color.map(validate_color).transpose()?;

    let Some(existing) = get_folder(db, user_id, folder_id).await? else {
        return Ok(None);
    };
    if name.is_none() && color.is_none() {
        return Ok(Some(existing));
    }

    let mut folder: folder::ActiveModel = existing.into();
    if let Some(name) = name {
        folder.name = Set(name);
    }
    if let Some(color) = color {
        folder.color = Set(color);
    }
    Ok(Some(folder.update(db).await?))
}

/// Deletes a folder. Items filed in it are kept and become unfiled.
///
/// # Errors
/// Returns an error if a database operation fails.
pub async fn delete_folder(db: &DatabaseConnection, user_id: &str, folder_id: i64) -> Result<bool> {
    let txn = db.begin().await?;

    if Folder::find_by_id(folder_id)
        .filter(folder::Column::UserId.eq(user_id))
        .one(&txn)
        .await?
        .is_none()
    {
        return Ok(false);
    }

    Item::update_many()
        .col_expr(item::Column::FolderId, Expr::value(Option::<i64>::None))
        .filter(item::Column::FolderId.eq(folder_id))
        .exec(&txn)
        .await?;
    Folder::delete_by_id(folder_id).exec(&txn).await?;

    txn.commit().await?;
    Ok(true)
}

/// Seeds [`DEFAULT_FOLDERS`] for a user who has no folders yet.
///
/// Returns the folders that were created, which is empty when the user
/// already had at least one folder.
///
/// # Errors
/// Returns an error if a database operation fails.
pub async fn initialize_default_folders(
    db: &DatabaseConnection,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<Vec<FolderModel>> {
    let existing = Folder::find()
        .filter(folder::Column::UserId.eq(user_id))
        .count(db)
        .await?;
    if existing > 0 {
        return Ok(Vec::new());
    }

    let mut created = Vec::with_capacity(DEFAULT_FOLDERS.len());
    for (name, color) in DEFAULT_FOLDERS {
        created.push(create_folder(db, user_id, name, Some(color), now).await?);
    }
    info!(user_id, "Created default folders");
    Ok(created)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::item::{ItemDraft, archive_item, create_item},
        core::schedule::SchedulePolicy,
        store::ItemStore,
        test_utils::*,
    };

    #[tokio::test]
    async fn test_create_folder_defaults_color() -> Result<()> {
        let db = setup_test_db().await?;
        let folder = create_folder(&db, "alice", " Gadgets ", None, t0()).await?;

        assert_eq!(folder.name, "Gadgets");
        assert_eq!(folder.color, DEFAULT_FOLDER_COLOR);
        assert_eq!(folder.user_id, "alice");
        Ok(())
    }

    #[tokio::test]
    async fn test_create_folder_validation() -> Result<()> {
        let db = setup_test_db().await?;

        assert!(matches!(
            create_folder(&db, "alice", "", None, t0()).await,
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            create_folder(&db, "alice", "Toys", Some("blue"), t0()).await,
            Err(Error::Validation { .. })
        ));
        let short = create_folder(&db, "alice", "Toys", Some("#0af"), t0()).await?;
        assert_eq!(short.color, "#0AF");
        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_default_folders_once() -> Result<()> {
        let db = setup_test_db().await?;

        let created = initialize_default_folders(&db, "alice", t0()).await?;
        let names: Vec<&str> = created.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Electronics", "Home & Garden", "Clothing", "Books"]);

        assert!(initialize_default_folders(&db, "alice", t0()).await?.is_empty());
        assert_eq!(get_folders(&db, "alice").await?.len(), 4);
        assert!(get_folders(&db, "bob").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_folder_counts_only_active_items() -> Result<()> {
        let db = setup_test_db().await?;
        let folder = create_folder(&db, "alice", "Outdoors", None, t0()).await?;

        let mut draft = ItemDraft::new("Tent", 150.0, &["1week"]);
        draft.folder_id = Some(folder.id);
        create_item(&db, "alice", draft.clone(), SchedulePolicy::Lenient, t0()).await?;
        let archived = create_item(&db, "alice", draft, SchedulePolicy::Lenient, t0()).await?;
        archive_item(&db, "alice", archived.item.id, "Borrowed one", t0()).await?;

        let counts = get_folders_with_counts(&db, "alice").await?;
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].item_count, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_folder() -> Result<()> {
        let db = setup_test_db().await?;
        let folder = create_folder(&db, "alice", "Books", None, t0()).await?;

        let updated = update_folder(&db, "alice", folder.id, None, Some("#f59e0b"))
            .await?
            .unwrap();
        assert_eq!(updated.name, "Books");
        assert_eq!(updated.color, "#F59E0B");

        assert!(
            update_folder(&db, "bob", folder.id, Some("Mine"), None)
                .await?
                .is_none()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_folder_unfiles_items() -> Result<()> {
        let db = setup_test_db().await?;
        let folder = create_folder(&db, "alice", "Kitchen", None, t0()).await?;
        let mut draft = ItemDraft::new("Blender", 89.0, &["1day"]);
        draft.folder_id = Some(folder.id);
        let created = create_item(&db, "alice", draft, SchedulePolicy::Lenient, t0()).await?;

        assert!(!delete_folder(&db, "bob", folder.id).await?);
        assert!(delete_folder(&db, "alice", folder.id).await?);

        assert!(get_folder(&db, "alice", folder.id).await?.is_none());
        let item = db.get_item(created.item.id, None).await?.unwrap();
        assert_eq!(item.folder_id, None);
        Ok(())
    }
}
