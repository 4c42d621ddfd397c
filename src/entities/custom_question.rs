//! Custom question entity - A user-authored reflection question for an item.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Custom question database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "custom_questions")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: String,
    /// Item the question is asked about
    pub item_id: i64,
    /// Question text
    pub question: String,
    /// Interval label the question applies to
    pub review_type: String,
    /// When the question was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `CustomQuestion` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each question belongs to one item
    #[sea_orm(
        belongs_to = "super::item::Entity",
        from = "Column::ItemId",
        to = "super::item::Column::Id"
    )]
    Item,
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
