//! Review completion.
//!
//! A checkpoint moves from pending to completed exactly once, either with the
//! user's answers or through a skip. Completing with an `archive` decision
//! also archives the item, but the two writes are separate operations:
//! [`complete_review`] and [`crate::core::item::archive_item`] can each be
//! called (and fail) on their own, and [`submit_review`] simply runs one
//! after the other.

use crate::{
    core::item::archive_item,
    entities::{ItemModel, ReviewModel, review::ReviewResponses},
    errors::{Error, Result},
    store::{ItemStore, ReviewChanges, ReviewStore},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tracing::{info, warn};

/// Response key written when a review is skipped
pub const SKIPPED_RESPONSE_KEY: &str = "skipped";

/// Archive reason used when a review decides to archive the item
pub const REVIEW_ARCHIVE_REASON: &str = "Decided during review process";

/// Outcome the user chose at a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    /// Keep thinking about it
    Keep,
    /// Decided not to buy; the item gets archived
    Archive,
    /// Decided to buy
    Purchase,
}

impl ReviewDecision {
    /// Stored representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Keep => "keep",
            Self::Archive => "archive",
            Self::Purchase => "purchase",
        }
    }

    /// Whether this decision archives the item
    #[must_use]
    pub const fn archives_item(self) -> bool {
        matches!(self, Self::Archive)
    }
}

impl fmt::Display for ReviewDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewDecision {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "keep" => Ok(Self::Keep),
            "archive" => Ok(Self::Archive),
            "purchase" => Ok(Self::Purchase),
            other => Err(Error::InvalidDecision {
                value: other.to_string(),
            }),
        }
    }
}

/// What the user submits to complete a checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSubmission {
    /// Answers keyed by question
    pub responses: ReviewResponses,
    /// Chosen outcome
    pub decision: ReviewDecision,
}

impl ReviewSubmission {
    /// A submission with answers and a decision.
    #[must_use]
    pub const fn new(responses: ReviewResponses, decision: ReviewDecision) -> Self {
        Self {
            responses,
            decision,
        }
    }

    /// The marker submission stored when a user skips a checkpoint.
    #[must_use]
    pub fn skipped() -> Self {
        let mut responses = ReviewResponses::default();
        responses
            .0
            .insert(SKIPPED_RESPONSE_KEY.to_string(), serde_json::Value::Bool(true));
        Self::new(responses, ReviewDecision::Keep)
    }

    /// Whether this is the skip marker
    #[must_use]
    pub fn is_skip(&self) -> bool {
        self.responses.0.get(SKIPPED_RESPONSE_KEY) == Some(&serde_json::Value::Bool(true))
    }
}

/// Result of [`submit_review`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewOutcome {
    /// The completed checkpoint
    pub review: ReviewModel,
    /// The archived item, when the decision was `archive`
    pub archived_item: Option<ItemModel>,
}

/// Marks a pending checkpoint completed.
///
/// Returns `Ok(None)` when the review does not exist for `user_id`.
///
/// # Errors
/// [`Error::ReviewAlreadyCompleted`] when the checkpoint was completed before.
pub async fn complete_review<R>(
    store: &R,
    user_id: &str,
    review_id: i64,
    submission: ReviewSubmission,
    now: DateTime<Utc>,
) -> Result<Option<ReviewModel>>
where
    R: ReviewStore + ?Sized,
{
    let Some(existing) = store.get_review(review_id, Some(user_id)).await? else {
        return Ok(None);
    };
    if existing.is_completed {
        return Err(Error::ReviewAlreadyCompleted { id: review_id });
    }

    let changes =
        ReviewChanges::completed(submission.responses, submission.decision.as_str(), now);
    store.update_review(review_id, Some(user_id), changes).await
}

/// Completes a checkpoint with the skip marker and a `keep` decision.
pub async fn skip_review<R>(
    store: &R,
    user_id: &str,
    review_id: i64,
    now: DateTime<Utc>,
) -> Result<Option<ReviewModel>>
where
    R: ReviewStore + ?Sized,
{
    complete_review(store, user_id, review_id, ReviewSubmission::skipped(), now).await
}

/// Completes a checkpoint, then archives its item if the decision says so.
///
/// The review stays completed if archiving fails; the error is returned and
/// the archive can be retried with [`archive_item`].
pub async fn submit_review<S>(
    store: &S,
    user_id: &str,
    review_id: i64,
    submission: ReviewSubmission,
    now: DateTime<Utc>,
) -> Result<Option<ReviewOutcome>>
where
    S: ItemStore + ReviewStore + ?Sized,
{
    let decision = submission.decision;
    let Some(review) = complete_review(store, user_id, review_id, submission, now).await? else {
        return Ok(None);
    };
    info!(
        review_id,
        item_id = review.item_id,
        decision = %decision,
        "Review completed"
    );

    let archived_item = if decision.archives_item() {
        let archived = archive_item(store, user_id, review.item_id, REVIEW_ARCHIVE_REASON, now)
            .await
            .inspect_err(|e| {
                warn!(
                    review_id,
                    item_id = review.item_id,
                    "Review completed but archiving the item failed: {e}"
                );
            })?;
        if archived.is_none() {
            warn!(
                review_id,
                item_id = review.item_id,
                "Review completed but its item no longer exists"
            );
        }
        archived
    } else {
        None
    };

    Ok(Some(ReviewOutcome {
        review,
        archived_item,
    }))
}

/// All checkpoints of one item for `user_id`, earliest first.
pub async fn get_reviews_for_item<R>(
    store: &R,
    user_id: &str,
    item_id: i64,
) -> Result<Vec<ReviewModel>>
where
    R: ReviewStore + ?Sized,
{
    store
        .get_reviews(&crate::store::ReviewFilter::for_user(user_id).for_item(item_id))
        .await
}
