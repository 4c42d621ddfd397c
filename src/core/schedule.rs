//! Review schedule expansion.
//!
//! Turns the interval labels a user picked for an item (`"1day"`, `"1week"`,
//! ...) into concrete checkpoint times relative to the item's creation
//! instant. Expansion is pure; [`schedule_reviews_for_item`] writes the
//! resulting checkpoints through a [`ReviewStore`].

use crate::{
    entities::{ItemModel, ReviewModel},
    errors::{Error, Result},
    store::{NewReview, ReviewStore},
};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tracing::debug;

/// One entry of the fixed review cadence vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IntervalLabel {
    /// One day after creation
    #[serde(rename = "1day")]
    OneDay,
    /// Seven days after creation
    #[serde(rename = "1week")]
    OneWeek,
    /// Thirty days after creation
    #[serde(rename = "1month")]
    OneMonth,
    /// Ninety days after creation
    #[serde(rename = "3months")]
    ThreeMonths,
    /// 180 days after creation
    #[serde(rename = "6months")]
    SixMonths,
    /// 365 days after creation
    #[serde(rename = "1year")]
    OneYear,
}

impl IntervalLabel {
    /// Every label, shortest interval first
    pub const ALL: [Self; 6] = [
        Self::OneDay,
        Self::OneWeek,
        Self::OneMonth,
        Self::ThreeMonths,
        Self::SixMonths,
        Self::OneYear,
    ];

    /// User-facing token
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneDay => "1day",
            Self::OneWeek => "1week",
            Self::OneMonth => "1month",
            Self::ThreeMonths => "3months",
            Self::SixMonths => "6months",
            Self::OneYear => "1year",
        }
    }

    /// Whole days between item creation and the checkpoint
    #[must_use]
    pub const fn offset_days(self) -> i64 {
        match self {
            Self::OneDay => 1,
            Self::OneWeek => 7,
            Self::OneMonth => 30,
            Self::ThreeMonths => 90,
            Self::SixMonths => 180,
            Self::OneYear => 365,
        }
    }

    /// Offset as a duration
    #[must_use]
    pub fn offset(self) -> TimeDelta {
        TimeDelta::days(self.offset_days())
    }
}

impl fmt::Display for IntervalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntervalLabel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| Error::UnknownInterval {
                label: s.to_string(),
            })
    }
}

/// How labels outside the vocabulary are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulePolicy {
    /// Unknown labels are dropped without error
    #[default]
    Lenient,
    /// Unknown labels reject the whole schedule
    Strict,
}

/// A checkpoint time computed from a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedCheckpoint {
    /// Label the checkpoint comes from
    pub label: IntervalLabel,
    /// When the checkpoint becomes due
    pub scheduled_for: DateTime<Utc>,
}

/// Parses raw labels into distinct [`IntervalLabel`]s, keeping first-seen order.
///
/// # Errors
/// - [`Error::EmptySchedule`] when no label survives parsing
/// - [`Error::UnknownInterval`] for an unknown label under [`SchedulePolicy::Strict`]
pub fn resolve_labels<S: AsRef<str>>(
    labels: &[S],
    policy: SchedulePolicy,
) -> Result<Vec<IntervalLabel>> {
    let mut resolved = Vec::with_capacity(labels.len());
    for raw in labels {
        let raw = raw.as_ref();
        match raw.parse::<IntervalLabel>() {
            Ok(label) => {
                if !resolved.contains(&label) {
                    resolved.push(label);
                }
            }
            Err(e) => match policy {
                SchedulePolicy::Strict => return Err(e),
                SchedulePolicy::Lenient => debug!("Skipping unknown review interval '{raw}'"),
            },
        }
    }

    if resolved.is_empty() {
        return Err(Error::EmptySchedule);
    }
    Ok(resolved)
}

/// Computes one checkpoint per distinct valid label, each at
/// `created_at + offset(label)`.
pub fn expand_schedule<S: AsRef<str>>(
    labels: &[S],
    created_at: DateTime<Utc>,
    policy: SchedulePolicy,
) -> Result<Vec<PlannedCheckpoint>> {
    Ok(resolve_labels(labels, policy)?
        .into_iter()
        .map(|label| PlannedCheckpoint {
            label,
            scheduled_for: created_at + label.offset(),
        })
        .collect())
}

/// Writes pending review checkpoints for an item.
///
/// All checkpoints share `now` as their creation instant.
pub async fn schedule_reviews_for_item<R>(
    store: &R,
    item: &ItemModel,
    checkpoints: &[PlannedCheckpoint],
    now: DateTime<Utc>,
) -> Result<Vec<ReviewModel>>
where
    R: ReviewStore + ?Sized,
{
    let mut reviews = Vec::with_capacity(checkpoints.len());
    for checkpoint in checkpoints {
        let review = store
            .create_review(NewReview {
                user_id: item.user_id.clone(),
                item_id: item.id,
                review_type: checkpoint.label.as_str().to_string(),
                scheduled_for: checkpoint.scheduled_for,
                created_at: now,
            })
            .await?;
        reviews.push(review);
    }

    debug!(
        item_id = item.id,
        count = reviews.len(),
        "Scheduled review checkpoints"
    );
    Ok(reviews)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::store::ItemStore;
    use crate::test_utils::*;

    #[test]
    fn test_label_round_trip_and_offsets() {
        let offsets: Vec<i64> = IntervalLabel::ALL
            .iter()
            .map(|label| label.offset_days())
            .collect();
        assert_eq!(offsets, vec![1, 7, 30, 90, 180, 365]);

        for label in IntervalLabel::ALL {
            assert_eq!(label.as_str().parse::<IntervalLabel>().unwrap(), label);
        }
        assert!("2weeks".parse::<IntervalLabel>().is_err());
    }

    #[test]
    fn test_expand_day_and_week() {
        let checkpoints =
            expand_schedule(&["1day", "1week"], t0(), SchedulePolicy::Lenient).unwrap();

        assert_eq!(checkpoints.len(), 2);
        assert_eq!(checkpoints[0].scheduled_for, utc(2024, 1, 2));
        assert_eq!(checkpoints[1].scheduled_for, utc(2024, 1, 8));
    }

    #[test]
    fn test_expand_every_label() {
        let labels: Vec<&str> = IntervalLabel::ALL.iter().map(|l| l.as_str()).collect();
        let checkpoints = expand_schedule(&labels, t0(), SchedulePolicy::Strict).unwrap();

        assert_eq!(checkpoints.len(), 6);
        for checkpoint in checkpoints {
            assert_eq!(
                checkpoint.scheduled_for - t0(),
                TimeDelta::days(checkpoint.label.offset_days())
            );
        }
    }

    #[test]
    fn test_duplicates_collapse() {
        let checkpoints =
            expand_schedule(&["1week", "1week", "1day"], t0(), SchedulePolicy::Lenient).unwrap();
        let labels: Vec<IntervalLabel> = checkpoints.iter().map(|c| c.label).collect();
        assert_eq!(labels, vec![IntervalLabel::OneWeek, IntervalLabel::OneDay]);
    }

    #[test]
    fn test_lenient_skips_unknown_labels() {
        let checkpoints =
            expand_schedule(&["1day", "fortnight"], t0(), SchedulePolicy::Lenient).unwrap();
        assert_eq!(checkpoints.len(), 1);
        assert_eq!(checkpoints[0].label, IntervalLabel::OneDay);

        // Nothing usable left over is the same as no schedule at all
        let result = expand_schedule(&["soon", "fortnight"], t0(), SchedulePolicy::Lenient);
        assert!(matches!(result, Err(Error::EmptySchedule)));
    }

    #[test]
    fn test_strict_rejects_unknown_labels() {
        let result = expand_schedule(&["1day", "fortnight"], t0(), SchedulePolicy::Strict);
        assert!(matches!(
            result,
            Err(Error::UnknownInterval { label }) if label == "fortnight"
        ));
    }

    #[test]
    fn test_empty_schedule_rejected() {
        let labels: [&str; 0] = [];
        for policy in [SchedulePolicy::Lenient, SchedulePolicy::Strict] {
            assert!(matches!(
                expand_schedule(&labels, t0(), policy),
                Err(Error::EmptySchedule)
            ));
        }
    }

    #[tokio::test]
    async fn test_schedule_reviews_for_item_persists_pending_checkpoints() -> Result<()> {
        let db = setup_test_db().await?;
        let item = db.create_item(new_item("alice", "Tent", 120.0)).await?;
        let checkpoints =
            expand_schedule(&["1day", "1week"], t0(), SchedulePolicy::Lenient)?;

        let reviews = schedule_reviews_for_item(&db, &item, &checkpoints, t0()).await?;

        assert_eq!(reviews.len(), 2);
        for review in &reviews {
            assert!(!review.is_completed);
            assert!(review.completed_at.is_none());
            assert!(review.decision.is_none());
            assert_eq!(review.created_at, t0());
            assert_eq!(review.user_id, "alice");
            assert_eq!(review.item_id, item.id);
        }
        assert_eq!(reviews[0].scheduled_for, utc(2024, 1, 2));
        assert_eq!(reviews[1].scheduled_for, utc(2024, 1, 8));
        Ok(())
    }
}
