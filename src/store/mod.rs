//! Persistence interfaces for items and review checkpoints.
//!
//! The scheduling core never talks to a database directly. It works against
//! [`ItemStore`] and [`ReviewStore`], which are implemented both for a
//! `SeaORM` [`DatabaseConnection`](sea_orm::DatabaseConnection) and for the
//! in-memory [`MemoryStore`]. Every method that takes an `owner` scopes the
//! lookup to that user when it is `Some`, and searches system-wide when it is
//! `None` (the background sweeper's view).
//!
//! Ids that do not resolve are reported as `Ok(None)` / `Ok(false)`.

/// `SeaORM` backend
pub mod database;
/// In-memory backend
pub mod memory;

pub use memory::MemoryStore;

use crate::{
    core::progress::is_due,
    entities::{
        item::{AiFeatures, PriceHistory, ReviewSchedule},
        review::ReviewResponses,
        ItemModel, ReviewModel,
    },
    errors::Result,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Fully-formed item record ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    /// Owning user
    pub user_id: String,
    /// Product name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Original price
    pub price: f64,
    /// Tracked price
    pub current_price: f64,
    /// Initial price history
    pub price_history: PriceHistory,
    /// Optional product link
    pub product_url: Option<String>,
    /// Optional notes
    pub notes: Option<String>,
    /// Optional folder
    pub folder_id: Option<i64>,
    /// AI feature toggles
    pub ai_features: AiFeatures,
    /// Accepted interval labels
    pub review_schedule: ReviewSchedule,
    /// Creation instant
    pub created_at: DateTime<Utc>,
}

/// Partial item update. `None` leaves a field untouched; for nullable
/// columns `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemChanges {
    /// New name
    pub name: Option<String>,
    /// New description
    pub description: Option<Option<String>>,
    /// New original price
    pub price: Option<f64>,
    /// New tracked price
    pub current_price: Option<f64>,
    /// Replacement price history
    pub price_history: Option<PriceHistory>,
    /// New product link
    pub product_url: Option<Option<String>>,
    /// New notes
    pub notes: Option<Option<String>>,
    /// New folder
    pub folder_id: Option<Option<i64>>,
    /// New AI feature toggles
    pub ai_features: Option<AiFeatures>,
}

impl ItemChanges {
    /// Whether the update would not touch any column
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Applies the changes to an in-memory record.
    pub fn apply(self, item: &mut ItemModel) {
        if let Some(name) = self.name {
            item.name = name;
        }
        if let Some(description) = self.description {
            item.description = description;
        }
        if let Some(price) = self.price {
            item.price = price;
        }
        if let Some(current_price) = self.current_price {
            item.current_price = current_price;
        }
        if let Some(price_history) = self.price_history {
            item.price_history = price_history;
        }
        if let Some(product_url) = self.product_url {
            item.product_url = product_url;
        }
        if let Some(notes) = self.notes {
            item.notes = notes;
        }
        if let Some(folder_id) = self.folder_id {
            item.folder_id = folder_id;
        }
        if let Some(ai_features) = self.ai_features {
            item.ai_features = ai_features;
        }
    }
}

/// Item query. Unset fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    /// Only items owned by this user
    pub user_id: Option<String>,
    /// Only items filed in this folder
    pub folder_id: Option<i64>,
    /// Only archived (`true`) or only active (`false`) items
    pub is_archived: Option<bool>,
}

impl ItemFilter {
    /// All items of one user
    #[must_use]
    pub fn for_user(user_id: &str) -> Self {
        Self {
            user_id: Some(user_id.to_string()),
            ..Self::default()
        }
    }

    /// Restricts the filter to one folder.
    #[must_use]
    pub const fn in_folder(mut self, folder_id: i64) -> Self {
        self.folder_id = Some(folder_id);
        self
    }

    /// Restricts the filter to archived or active items.
    #[must_use]
    pub const fn archived(mut self, is_archived: bool) -> Self {
        self.is_archived = Some(is_archived);
        self
    }

    /// Whether an item satisfies the filter
    #[must_use]
    pub fn matches(&self, item: &ItemModel) -> bool {
        self.user_id.as_ref().is_none_or(|u| &item.user_id == u)
            && self.folder_id.is_none_or(|f| item.folder_id == Some(f))
            && self.is_archived.is_none_or(|a| item.is_archived == a)
    }
}

/// A pending checkpoint to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    /// Owning user
    pub user_id: String,
    /// Item under review
    pub item_id: i64,
    /// Interval label the checkpoint comes from
    pub review_type: String,
    /// When the checkpoint becomes due
    pub scheduled_for: DateTime<Utc>,
    /// Creation instant, shared by every checkpoint of one item
    pub created_at: DateTime<Utc>,
}

/// Partial review update. `scheduled_for` is deliberately absent: it is
/// fixed at creation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewChanges {
    /// New completion flag
    pub is_completed: Option<bool>,
    /// New completion instant
    pub completed_at: Option<Option<DateTime<Utc>>>,
    /// Replacement answers
    pub responses: Option<ReviewResponses>,
    /// New decision
    pub decision: Option<Option<String>>,
}

impl ReviewChanges {
    /// Changes that move a pending checkpoint to the completed state.
    #[must_use]
    pub fn completed(responses: ReviewResponses, decision: &str, now: DateTime<Utc>) -> Self {
        Self {
            is_completed: Some(true),
            completed_at: Some(Some(now)),
            responses: Some(responses),
            decision: Some(Some(decision.to_string())),
        }
    }

    /// Whether the update would not touch any column
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Applies the changes to an in-memory record.
    pub fn apply(self, review: &mut ReviewModel) {
        if let Some(is_completed) = self.is_completed {
            review.is_completed = is_completed;
        }
        if let Some(completed_at) = self.completed_at {
            review.completed_at = completed_at;
        }
        if let Some(responses) = self.responses {
            review.responses = responses;
        }
        if let Some(decision) = self.decision {
            review.decision = decision;
        }
    }
}

/// Review query. Unset fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewFilter {
    /// Only reviews owned by this user
    pub user_id: Option<String>,
    /// Only reviews of this item
    pub item_id: Option<i64>,
    /// Only completed (`true`) or only pending (`false`) reviews
    pub is_completed: Option<bool>,
    /// Only reviews generated from this interval label
    pub review_type: Option<String>,
}

impl ReviewFilter {
    /// All reviews of one user
    #[must_use]
    pub fn for_user(user_id: &str) -> Self {
        Self {
            user_id: Some(user_id.to_string()),
            ..Self::default()
        }
    }

    /// Restricts the filter to one item.
    #[must_use]
    pub const fn for_item(mut self, item_id: i64) -> Self {
        self.item_id = Some(item_id);
        self
    }

    /// Restricts the filter to completed or pending reviews.
    #[must_use]
    pub const fn completed(mut self, is_completed: bool) -> Self {
        self.is_completed = Some(is_completed);
        self
    }

    /// Restricts the filter to one interval label.
    #[must_use]
    pub fn of_type(mut self, review_type: &str) -> Self {
        self.review_type = Some(review_type.to_string());
        self
    }

    /// Whether a review satisfies the filter
    #[must_use]
    pub fn matches(&self, review: &ReviewModel) -> bool {
        self.user_id.as_ref().is_none_or(|u| &review.user_id == u)
            && self.item_id.is_none_or(|i| review.item_id == i)
            && self.is_completed.is_none_or(|c| review.is_completed == c)
            && self
                .review_type
                .as_ref()
                .is_none_or(|t| &review.review_type == t)
    }
}

/// Storage of prospective purchases.
///
/// Results of [`ItemStore::get_items`] are ordered by creation time, then id.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Inserts an item and returns it with its assigned id.
    async fn create_item(&self, item: NewItem) -> Result<ItemModel>;

    /// Looks an item up by id.
    async fn get_item(&self, id: i64, owner: Option<&str>) -> Result<Option<ItemModel>>;

    /// Lists the items matching `filter`.
    async fn get_items(&self, filter: &ItemFilter) -> Result<Vec<ItemModel>>;

    /// Applies a partial update and returns the updated item.
    async fn update_item(
        &self,
        id: i64,
        owner: Option<&str>,
        changes: ItemChanges,
    ) -> Result<Option<ItemModel>>;

    /// Archives an item and records a money-saved achievement.
    ///
    /// Archiving an item that is already archived returns it unchanged and
    /// records nothing.
    async fn archive_item(
        &self,
        id: i64,
        owner: Option<&str>,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ItemModel>>;

    /// Deletes an item together with its reviews and custom questions.
    async fn delete_item(&self, id: i64, owner: Option<&str>) -> Result<bool>;
}

/// Storage of review checkpoints.
///
/// Results of [`ReviewStore::get_reviews`] are ordered by scheduled time, then id.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Inserts a pending checkpoint.
    async fn create_review(&self, review: NewReview) -> Result<ReviewModel>;

    /// Looks a checkpoint up by id.
    async fn get_review(&self, id: i64, owner: Option<&str>) -> Result<Option<ReviewModel>>;

    /// Applies a partial update and returns the updated checkpoint.
    async fn update_review(
        &self,
        id: i64,
        owner: Option<&str>,
        changes: ReviewChanges,
    ) -> Result<Option<ReviewModel>>;

    /// Lists the checkpoints matching `filter`.
    async fn get_reviews(&self, filter: &ReviewFilter) -> Result<Vec<ReviewModel>>;

    /// Pending checkpoints whose scheduled time is at or before `as_of`.
    async fn get_due_reviews(
        &self,
        owner: Option<&str>,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<ReviewModel>> {
        let filter = ReviewFilter {
            user_id: owner.map(str::to_string),
            ..ReviewFilter::default()
        }
        .completed(false);

        let pending = self.get_reviews(&filter).await?;
        Ok(pending
            .into_iter()
            .filter(|review| is_due(review, as_of))
            .collect())
    }
}
