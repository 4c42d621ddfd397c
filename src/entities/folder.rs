//! Folder entity - A named, colored grouping of items owned by one user.
//!
//! The number of items in a folder is derived on read and never stored.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Folder database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "folders")]
pub struct Model {
    /// Unique identifier for the folder
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: String,
    /// Display name (e.g., "Electronics")
    pub name: String,
    /// Hex color used by clients (e.g., `"#6366F1"`)
    pub color: String,
    /// When the folder was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Folder and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One folder holds many items
    #[sea_orm(has_many = "super::item::Entity")]
    Items,
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
