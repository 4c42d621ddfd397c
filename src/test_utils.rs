//! Shared test utilities for `mindful-cart`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating items and checkpoints with sensible defaults. All timestamps
//! are fixed so time-dependent behaviour is deterministic.

use crate::{
    core::{
        item::{CreatedItem, ItemDraft, create_item},
        schedule::SchedulePolicy,
    },
    entities::{
        ItemModel, ReviewModel,
        item::{AiFeatures, PriceHistory, ReviewSchedule},
        review::ReviewResponses,
    },
    errors::Result,
    store::{ItemStore, NewItem, ReviewStore},
};
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all database-backed tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Midnight UTC on the given date.
///
/// # Panics
/// Panics on an invalid date; only meant for literals in tests.
#[allow(clippy::unwrap_used)]
pub fn utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// The creation instant used across tests: `2024-01-01T00:00:00Z`.
pub fn t0() -> DateTime<Utc> {
    utc(2024, 1, 1)
}

/// A ready-to-insert item created at [`t0`] with no checkpoints.
///
/// # Defaults
/// * `current_price`: same as `price`, with one history sample
/// * `ai_features`: price tracking and alternatives on
/// * `review_schedule`: empty
pub fn new_item(user_id: &str, name: &str, price: f64) -> NewItem {
    NewItem {
        user_id: user_id.to_string(),
        name: name.to_string(),
        description: None,
        price,
        current_price: price,
        price_history: PriceHistory::starting_at(price, t0()),
        product_url: None,
        notes: None,
        folder_id: None,
        ai_features: AiFeatures::default(),
        review_schedule: ReviewSchedule::default(),
        created_at: t0(),
    }
}

/// Creates an item priced at 100.0 through the normal creation path, at
/// [`t0`], with checkpoints for `labels`.
pub async fn create_test_item<S>(
    store: &S,
    user_id: &str,
    name: &str,
    labels: &[&str],
) -> Result<CreatedItem>
where
    S: ItemStore + ReviewStore + ?Sized,
{
    create_item(
        store,
        user_id,
        ItemDraft::new(name, 100.0, labels),
        SchedulePolicy::Lenient,
        t0(),
    )
    .await
}

/// An item record built in memory, never stored.
pub fn item_model(id: i64, user_id: &str, name: &str, price: f64) -> ItemModel {
    ItemModel {
        id,
        user_id: user_id.to_string(),
        name: name.to_string(),
        description: None,
        price,
        current_price: price,
        price_history: PriceHistory::starting_at(price, t0()),
        product_url: None,
        notes: None,
        folder_id: None,
        is_archived: false,
        archived_at: None,
        archived_reason: None,
        ai_features: AiFeatures::default(),
        review_schedule: ReviewSchedule::default(),
        created_at: t0(),
    }
}

/// A checkpoint record built in memory, never stored.
///
/// Completed checkpoints carry a `keep` decision and are completed at
/// their scheduled time.
pub fn review_model(
    id: i64,
    item_id: i64,
    scheduled_for: DateTime<Utc>,
    is_completed: bool,
) -> ReviewModel {
    ReviewModel {
        id,
        user_id: "test_user".to_string(),
        item_id,
        scheduled_for,
        completed_at: is_completed.then_some(scheduled_for),
        review_type: "1day".to_string(),
        is_completed,
        responses: ReviewResponses::default(),
        decision: is_completed.then(|| "keep".to_string()),
        created_at: t0(),
    }
}
