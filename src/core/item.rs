//! Item business logic - Creating, editing, archiving and deleting
//! prospective purchases.
//!
//! Creating an item also expands its review schedule into pending
//! checkpoints. The schedule is validated before anything is written, so a
//! rejected schedule never leaves an item without its checkpoints.

use crate::{
    core::schedule::{SchedulePolicy, expand_schedule, schedule_reviews_for_item},
    entities::{
        ItemModel, ReviewModel,
        item::{AiFeatures, PriceHistory, ReviewSchedule},
    },
    errors::{Error, Result},
    store::{ItemChanges, ItemStore, NewItem, ReviewStore},
};
use chrono::{DateTime, Utc};
use tracing::info;

/// User input for a new item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    /// Product name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Price in dollars
    pub price: f64,
    /// Optional product link
    pub product_url: Option<String>,
    /// Optional notes
    pub notes: Option<String>,
    /// Optional folder
    pub folder_id: Option<i64>,
    /// AI feature toggles
    pub ai_features: AiFeatures,
    /// Requested interval labels, e.g. `["1week", "1month"]`
    pub review_schedule: Vec<String>,
}

impl ItemDraft {
    /// A draft with the required fields and default toggles.
    #[must_use]
    pub fn new<S: AsRef<str>>(name: &str, price: f64, review_schedule: &[S]) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            price,
            product_url: None,
            notes: None,
            folder_id: None,
            ai_features: AiFeatures::default(),
            review_schedule: review_schedule
                .iter()
                .map(|label| label.as_ref().to_string())
                .collect(),
        }
    }
}

/// A freshly created item with its pending checkpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedItem {
    /// The stored item
    pub item: ItemModel,
    /// Its checkpoints, in schedule order
    pub reviews: Vec<ReviewModel>,
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation {
            message: "Item name cannot be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn validate_price(price: f64) -> Result<f64> {
    if !price.is_finite() || price < 0.0 {
        return Err(Error::InvalidPrice { amount: price });
    }
    Ok(price)
}

/// Creates an item for `user_id` and schedules its review checkpoints.
///
/// The item starts with `current_price = price` and a one-sample price
/// history. Its stored schedule holds only the labels that were accepted.
///
/// # Errors
/// Returns an error if:
/// - The name is empty or whitespace-only
/// - The price is negative or not finite
/// - The schedule is empty, or has an unknown label under [`SchedulePolicy::Strict`]
/// - A store write fails
pub async fn create_item<S>(
    store: &S,
    user_id: &str,
    draft: ItemDraft,
    policy: SchedulePolicy,
    now: DateTime<Utc>,
) -> Result<CreatedItem>
where
    S: ItemStore + ReviewStore + ?Sized,
{
    let name = validate_name(&draft.name)?;
    let price = validate_price(draft.price)?;
    let checkpoints = expand_schedule(&draft.review_schedule, now, policy)?;

    let item = store
        .create_item(NewItem {
            user_id: user_id.to_string(),
            name,
            description: draft.description,
            price,
            current_price: price,
            price_history: PriceHistory::starting_at(price, now),
            product_url: draft.product_url,
            notes: draft.notes,
            folder_id: draft.folder_id,
            ai_features: draft.ai_features,
            review_schedule: ReviewSchedule(
                checkpoints
                    .iter()
                    .map(|c| c.label.as_str().to_string())
                    .collect(),
            ),
            created_at: now,
        })
        .await?;

    let reviews = schedule_reviews_for_item(store, &item, &checkpoints, now).await?;
    info!(
        item_id = item.id,
        user_id,
        checkpoints = reviews.len(),
        "Created item '{}'",
        item.name
    );
    Ok(CreatedItem { item, reviews })
}

/// Applies a partial update to an active item.
///
/// Returns `Ok(None)` when the item does not exist for `user_id`.
///
/// # Errors
/// Returns an error if:
/// - The item is archived
/// - A new name is empty, or a new price is negative or not finite
/// - The store write fails
pub async fn update_item<S>(
    store: &S,
    user_id: &str,
    item_id: i64,
    mut changes: ItemChanges,
) -> Result<Option<ItemModel>>
where
    S: ItemStore + ?Sized,
{
    let Some(existing) = store.get_item(item_id, Some(user_id)).await? else {
        return Ok(None);
    };
    if existing.is_archived {
        return Err(Error::ItemArchived { id: item_id });
    }

    if let Some(name) = changes.name.as_deref() {
        changes.name = Some(validate_name(name)?);
    }
    if let Some(price) = changes.price {
        validate_price(price)?;
    }
    if let Some(current_price) = changes.current_price {
        validate_price(current_price)?;
    }

    store.update_item(item_id, Some(user_id), changes).await
}

/// Archives an item and records the money-saved achievement.
///
/// Archiving an archived item returns it unchanged.
///
/// # Errors
/// Returns an error if the reason is blank or the store write fails.
pub async fn archive_item<S>(
    store: &S,
    user_id: &str,
    item_id: i64,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<Option<ItemModel>>
where
    S: ItemStore + ?Sized,
{
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(Error::Validation {
            message: "Archive reason is required".to_string(),
        });
    }

    let archived = store
        .archive_item(item_id, Some(user_id), reason, now)
        .await?;
    if let Some(item) = &archived {
        info!(item_id, user_id, "Archived item '{}': {reason}", item.name);
    }
    Ok(archived)
}

/// Deletes an item along with its checkpoints and custom questions.
///
/// Returns `false` when the item does not exist for `user_id`.
pub async fn delete_item<S>(store: &S, user_id: &str, item_id: i64) -> Result<bool>
where
    S: ItemStore + ?Sized,
{
    let deleted = store.delete_item(item_id, Some(user_id)).await?;
    if deleted {
        info!(item_id, user_id, "Deleted item");
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{
        store::{MemoryStore, ReviewFilter},
        test_utils::*,
    };

    #[tokio::test]
    async fn test_create_item_schedules_checkpoints() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_item(
            &db,
            "alice",
            ItemDraft::new("  Noise Cancelling Headphones ", 299.99, &["1day", "1week"]),
            SchedulePolicy::Lenient,
            t0(),
        )
        .await?;

        let item = &created.item;
        assert_eq!(item.name, "Noise Cancelling Headphones");
        assert_eq!(item.price, 299.99);
        assert_eq!(item.current_price, 299.99);
        assert_eq!(item.price_history.len(), 1);
        assert_eq!(item.price_history.latest().unwrap().date, t0());
        assert_eq!(item.review_schedule.0, vec!["1day", "1week"]);
        assert!(!item.is_archived);
        assert_eq!(item.created_at, t0());

        assert_eq!(created.reviews.len(), 2);
        assert_eq!(created.reviews[0].scheduled_for, utc(2024, 1, 2));
        assert_eq!(created.reviews[1].scheduled_for, utc(2024, 1, 8));
        assert!(created.reviews.iter().all(|r| !r.is_completed));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_item_keeps_only_accepted_labels() -> Result<()> {
        let store = MemoryStore::new();
        let created = create_item(
            &store,
            "alice",
            ItemDraft::new("Lamp", 40.0, &["1week", "someday", "1week"]),
            SchedulePolicy::Lenient,
            t0(),
        )
        .await?;

        assert_eq!(created.item.review_schedule.0, vec!["1week"]);
        assert_eq!(created.reviews.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_item_rejects_bad_input_before_writing() -> Result<()> {
        let store = MemoryStore::new();
        let no_labels: [&str; 0] = [];

        let cases = [
            ItemDraft::new("   ", 10.0, &["1day"]),
            ItemDraft::new("Lamp", -1.0, &["1day"]),
            ItemDraft::new("Lamp", f64::NAN, &["1day"]),
            ItemDraft::new("Lamp", 10.0, &no_labels),
            ItemDraft::new("Lamp", 10.0, &["fortnight"]),
            ItemDraft::new("Lamp", 10.0, &["fortnight"]),
        ];
        let results = [
            create_item(&store, "alice", cases[0].clone(), SchedulePolicy::Lenient, t0()).await,
            create_item(&store, "alice", cases[1].clone(), SchedulePolicy::Lenient, t0()).await,
            create_item(&store, "alice", cases[2].clone(), SchedulePolicy::Lenient, t0()).await,
            create_item(&store, "alice", cases[3].clone(), SchedulePolicy::Lenient, t0()).await,
            create_item(&store, "alice", cases[4].clone(), SchedulePolicy::Strict, t0()).await,
            create_item(&store, "alice", cases[5].clone(), SchedulePolicy::Lenient, t0()).await,
        ];

        assert!(matches!(results[0], Err(Error::Validation { .. })));
        assert!(matches!(results[1], Err(Error::InvalidPrice { .. })));
        assert!(matches!(results[2], Err(Error::InvalidPrice { .. })));
        assert!(matches!(results[3], Err(Error::EmptySchedule)));
        assert!(matches!(results[4], Err(Error::UnknownInterval { .. })));
        assert!(matches!(results[5], Err(Error::EmptySchedule)));

        assert!(store.get_items(&Default::default()).await?.is_empty());
        assert!(store.get_reviews(&ReviewFilter::default()).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_item_validates_and_applies() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_test_item(&db, "alice", "Lamp", &["1day"]).await?;

        let updated = update_item(
            &db,
            "alice",
            created.item.id,
            ItemChanges {
                name: Some(" Desk Lamp ".to_string()),
                notes: Some(Some("Check the warm-light version".to_string())),
                ..ItemChanges::default()
            },
        )
        .await?
        .unwrap();
        assert_eq!(updated.name, "Desk Lamp");
        assert_eq!(updated.notes.as_deref(), Some("Check the warm-light version"));

        let bad_price = update_item(
            &db,
            "alice",
            created.item.id,
            ItemChanges {
                price: Some(-5.0),
                ..ItemChanges::default()
            },
        )
        .await;
        assert!(matches!(bad_price, Err(Error::InvalidPrice { .. })));

        let other_user = update_item(&db, "bob", created.item.id, ItemChanges::default()).await?;
        assert!(other_user.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_archived_item_cannot_be_edited() -> Result<()> {
        let store = MemoryStore::new();
        let created = create_test_item(&store, "alice", "Lamp", &["1day"]).await?;
        archive_item(&store, "alice", created.item.id, "Found one at home", t0()).await?;

        let result = update_item(
            &store,
            "alice",
            created.item.id,
            ItemChanges {
                notes: Some(None),
                ..ItemChanges::default()
            },
        )
        .await;
        assert!(matches!(result, Err(Error::ItemArchived { id }) if id == created.item.id));
        Ok(())
    }

    #[tokio::test]
    async fn test_archive_requires_reason() -> Result<()> {
        let store = MemoryStore::new();
        let created = create_test_item(&store, "alice", "Lamp", &["1day"]).await?;

        let result = archive_item(&store, "alice", created.item.id, "  ", t0()).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let archived = archive_item(&store, "alice", created.item.id, " Not needed ", t0())
            .await?
            .unwrap();
        assert_eq!(archived.archived_reason.as_deref(), Some("Not needed"));
        assert!(archive_item(&store, "bob", created.item.id, "x", t0()).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_item() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_test_item(&db, "alice", "Lamp", &["1day", "1month"]).await?;

        assert!(!delete_item(&db, "bob", created.item.id).await?);
        assert!(delete_item(&db, "alice", created.item.id).await?);
        assert!(db.get_item(created.item.id, None).await?.is_none());
        assert!(
            db.get_reviews(&ReviewFilter::default().for_item(created.item.id))
                .await?
                .is_empty()
        );
        Ok(())
    }
}
