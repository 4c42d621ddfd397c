//! Per-user dashboard numbers.

use crate::{
    errors::Result,
    store::{ItemFilter, ItemStore, ReviewStore},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Summary shown on a user's dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    /// Items still being reflected on
    pub active_items: usize,
    /// Checkpoints due at the time of the query
    pub due_reviews: usize,
    /// Items the user decided against
    pub archived_items: usize,
    /// Sum of the original prices of archived items
    pub total_saved: f64,
}

/// Computes [`UserStats`] for `user_id` as of `now`.
pub async fn get_user_stats<S>(store: &S, user_id: &str, now: DateTime<Utc>) -> Result<UserStats>
where
    S: ItemStore + ReviewStore + ?Sized,
{
    let items = store.get_items(&ItemFilter::for_user(user_id)).await?;
    let (archived, active): (Vec<_>, Vec<_>) = items.into_iter().partition(|i| i.is_archived);
    let due_reviews = store.get_due_reviews(Some(user_id), now).await?.len();

    Ok(UserStats {
        active_items: active.len(),
        due_reviews,
        archived_items: archived.len(),
        total_saved: archived.iter().map(|i| i.price).sum(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{core::item::archive_item, store::MemoryStore, test_utils::*};

    #[tokio::test]
    async fn test_user_stats() -> Result<()> {
        let store = MemoryStore::new();
        create_test_item(&store, "alice", "Lamp", &["1day", "1week"]).await?;
        let drone = create_test_item(&store, "alice", "Drone", &["1month"]).await?;
        create_test_item(&store, "bob", "Sofa", &["1day"]).await?;
        archive_item(&store, "alice", drone.item.id, "Too loud", t0()).await?;

        let stats = get_user_stats(&store, "alice", utc(2024, 1, 3)).await?;
        assert_eq!(stats.active_items, 1);
        assert_eq!(stats.archived_items, 1);
        assert_eq!(stats.due_reviews, 1);
        assert_eq!(stats.total_saved, drone.item.price);
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_user_stats() -> Result<()> {
        let db = setup_test_db().await?;
        let stats = get_user_stats(&db, "nobody", t0()).await?;
        assert_eq!(stats.active_items, 0);
        assert_eq!(stats.due_reviews, 0);
        assert_eq!(stats.total_saved, 0.0);
        Ok(())
    }
}
