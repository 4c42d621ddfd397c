//! Item entity - A prospective purchase the user is reflecting on.
//!
//! Besides the scalar columns, an item carries three JSON columns: its price
//! history, its AI feature toggles, and the interval labels it was scheduled
//! with. An item is either active or archived; `archived_at` and
//! `archived_reason` are only set once `is_archived` is true.

use chrono::{DateTime, Utc};
use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    /// Unique identifier for the item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: String,
    /// Product name
    pub name: String,
    /// Optional longer description
    pub description: Option<String>,
    /// Price when the item was added, in dollars
    pub price: f64,
    /// Latest tracked price, in dollars
    pub current_price: f64,
    /// Ordered price samples, oldest first
    pub price_history: PriceHistory,
    /// Optional link to the product page
    pub product_url: Option<String>,
    /// Free-text notes
    pub notes: Option<String>,
    /// Folder the item is filed under, if any
    pub folder_id: Option<i64>,
    /// Whether the item has been archived
    pub is_archived: bool,
    /// When the item was archived
    pub archived_at: Option<DateTimeUtc>,
    /// Why the item was archived
    pub archived_reason: Option<String>,
    /// Which AI-backed features the owner enabled
    pub ai_features: AiFeatures,
    /// Interval labels the item was scheduled with (e.g. `"1week"`)
    pub review_schedule: ReviewSchedule,
    /// When the item was created
    pub created_at: DateTimeUtc,
}

/// One observed price at a point in time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    /// Observed price in dollars
    pub price: f64,
    /// When the price was observed
    pub date: DateTime<Utc>,
}

/// Price history stored as a JSON array of samples.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct PriceHistory(pub Vec<PriceSample>);

impl PriceHistory {
    /// Starts a history with a single sample.
    #[must_use]
    pub fn starting_at(price: f64, date: DateTime<Utc>) -> Self {
        Self(vec![PriceSample { price, date }])
    }

    /// Appends a sample to the end of the history.
    pub fn push(&mut self, price: f64, date: DateTime<Utc>) {
        self.0.push(PriceSample { price, date });
    }

    /// Number of recorded samples
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no sample has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Most recent sample, if any
    #[must_use]
    pub fn latest(&self) -> Option<&PriceSample> {
        self.0.last()
    }
}

/// Per-item toggles for AI-backed features.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(rename_all = "camelCase")]
pub struct AiFeatures {
    /// Refresh the tracked price during background sweeps
    pub price_tracking: bool,
    /// Suggest cheaper alternatives
    pub alternatives: bool,
    /// Report on sustainability
    pub sustainability: bool,
}

impl Default for AiFeatures {
    fn default() -> Self {
        Self {
            price_tracking: true,
            alternatives: true,
            sustainability: false,
        }
    }
}

/// Interval labels chosen at creation time, stored as a JSON array.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct ReviewSchedule(pub Vec<String>);

/// Defines relationships between Item and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each item may belong to one folder
    #[sea_orm(
        belongs_to = "super::folder::Entity",
        from = "Column::FolderId",
        to = "super::folder::Column::Id"
    )]
    Folder,
    /// One item has many review checkpoints
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
    /// One item has many custom reflection questions
    #[sea_orm(has_many = "super::custom_question::Entity")]
    CustomQuestions,
}

impl Related<super::folder::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Folder.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl Related<super::custom_question::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustomQuestions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
