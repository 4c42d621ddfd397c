//! Achievement entity - Immutable record written when an item is archived.
//!
//! `item_id` is kept for reference only; achievements outlive deleted items.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Achievement database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "achievements")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: String,
    /// Item whose archival produced this record
    pub item_id: Option<i64>,
    /// Kind of achievement, e.g. `"money_saved"`
    pub achievement_type: String,
    /// Short title
    pub title: String,
    /// Human-readable description
    pub description: String,
    /// Money value saved, in dollars
    pub value: Option<f64>,
    /// When the achievement was recorded
    pub unlocked_at: DateTimeUtc,
}

/// Achievements have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
