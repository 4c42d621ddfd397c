//! Due-set resolution and review progress.
//!
//! A checkpoint is due when it is still pending and its scheduled time has
//! passed. Everything here is read-only and derived from whatever snapshot the
//! store returns, so it needs no locking of its own.

use crate::{
    entities::{ItemModel, ReviewModel},
    errors::Result,
    store::{ItemFilter, ItemStore, ReviewFilter, ReviewStore},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Whether a checkpoint is pending and scheduled at or before `now`.
#[must_use]
pub fn is_due(review: &ReviewModel, now: DateTime<Utc>) -> bool {
    !review.is_completed && review.scheduled_for <= now
}

/// Completion counts for one item's checkpoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReviewProgress {
    /// Completed checkpoints
    pub completed: usize,
    /// All checkpoints
    pub total: usize,
    /// `completed / total * 100`, or 0 when there are no checkpoints
    pub percentage: f64,
}

impl ReviewProgress {
    /// Counts completed checkpoints among `reviews`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_reviews(reviews: &[ReviewModel]) -> Self {
        let total = reviews.len();
        let completed = reviews.iter().filter(|r| r.is_completed).count();
        let percentage = if total == 0 {
            0.0
        } else {
            completed as f64 / total as f64 * 100.0
        };

        Self {
            completed,
            total,
            percentage,
        }
    }

    /// Checkpoints still waiting to be completed
    #[must_use]
    pub const fn pending(&self) -> usize {
        self.total - self.completed
    }
}

/// Review state of a single item at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemReviewStatus {
    /// Completion counts
    pub review_progress: ReviewProgress,
    /// Whether any checkpoint is due
    pub is_due_for_review: bool,
    /// Earliest pending checkpoint, if any remain
    pub next_review: Option<DateTime<Utc>>,
}

impl ItemReviewStatus {
    /// Summarises one item's checkpoints as of `now`.
    #[must_use]
    pub fn from_reviews(reviews: &[ReviewModel], now: DateTime<Utc>) -> Self {
        Self {
            review_progress: ReviewProgress::from_reviews(reviews),
            is_due_for_review: reviews.iter().any(|r| is_due(r, now)),
            next_review: reviews
                .iter()
                .filter(|r| !r.is_completed)
                .map(|r| r.scheduled_for)
                .min(),
        }
    }
}

/// An item together with its review status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemWithProgress {
    /// The item
    #[serde(flatten)]
    pub item: ItemModel,
    /// Its review status
    #[serde(flatten)]
    pub status: ItemReviewStatus,
}

/// A due checkpoint together with the item it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DueReview {
    /// The due checkpoint
    #[serde(flatten)]
    pub review: ReviewModel,
    /// The item under review
    pub item: ItemModel,
}

/// Review status of one item, or `None` when the item does not exist for `user_id`.
pub async fn item_review_status<S>(
    store: &S,
    user_id: &str,
    item_id: i64,
    now: DateTime<Utc>,
) -> Result<Option<ItemReviewStatus>>
where
    S: ItemStore + ReviewStore + ?Sized,
{
    if store.get_item(item_id, Some(user_id)).await?.is_none() {
        return Ok(None);
    }

    let reviews = store
        .get_reviews(&ReviewFilter::for_user(user_id).for_item(item_id))
        .await?;
    Ok(Some(ItemReviewStatus::from_reviews(&reviews, now)))
}

/// Items matching `filter`, each with its review status as of `now`.
///
/// Reviews are fetched once for the filter's user (or for everyone when the
/// filter has no user) and grouped by item.
pub async fn items_with_progress<S>(
    store: &S,
    filter: &ItemFilter,
    now: DateTime<Utc>,
) -> Result<Vec<ItemWithProgress>>
where
    S: ItemStore + ReviewStore + ?Sized,
{
    let items = store.get_items(filter).await?;
    let review_filter = ReviewFilter {
        user_id: filter.user_id.clone(),
        ..ReviewFilter::default()
    };

    let mut by_item: HashMap<i64, Vec<ReviewModel>> = HashMap::new();
    for review in store.get_reviews(&review_filter).await? {
        by_item.entry(review.item_id).or_default().push(review);
    }

    Ok(items
        .into_iter()
        .map(|item| {
            let reviews = by_item.remove(&item.id).unwrap_or_default();
            let status = ItemReviewStatus::from_reviews(&reviews, now);
            ItemWithProgress { item, status }
        })
        .collect())
}

/// Due checkpoints of one user, earliest first, each paired with its item.
pub async fn due_reviews_for_user<S>(
    store: &S,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<Vec<DueReview>>
where
    S: ItemStore + ReviewStore + ?Sized,
{
    let due = store.get_due_reviews(Some(user_id), now).await?;
    if due.is_empty() {
        return Ok(Vec::new());
    }

    let items: HashMap<i64, ItemModel> = store
        .get_items(&ItemFilter::for_user(user_id))
        .await?
        .into_iter()
        .map(|item| (item.id, item))
        .collect();

    let mut resolved = Vec::with_capacity(due.len());
    for review in due {
        match items.get(&review.item_id) {
            Some(item) => resolved.push(DueReview {
                item: item.clone(),
                review,
            }),
            None => debug!(
                review_id = review.id,
                item_id = review.item_id,
                "Due review has no item, skipping"
            ),
        }
    }
    Ok(resolved)
}
