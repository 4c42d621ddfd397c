//! Review entity - One scheduled reflection checkpoint for an item.
//!
//! `completed_at` is set exactly when `is_completed` is true, and
//! `scheduled_for` never changes after insertion.

use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Review checkpoint database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    /// Unique identifier for the checkpoint
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: String,
    /// Item under review
    pub item_id: i64,
    /// When the checkpoint becomes due
    pub scheduled_for: DateTimeUtc,
    /// When the checkpoint was completed
    pub completed_at: Option<DateTimeUtc>,
    /// Interval label the checkpoint was generated from (e.g. `"1month"`)
    pub review_type: String,
    /// Whether the checkpoint has been completed
    pub is_completed: bool,
    /// Answers keyed by question
    pub responses: ReviewResponses,
    /// `"keep"`, `"archive"` or `"purchase"` once completed
    pub decision: Option<String>,
    /// When the checkpoint was created
    pub created_at: DateTimeUtc,
}

/// Free-form answers keyed by question, stored as a JSON object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct ReviewResponses(pub BTreeMap<String, serde_json::Value>);

/// Defines relationships between Review and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each review belongs to one item
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
