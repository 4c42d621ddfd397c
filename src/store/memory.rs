//! In-memory item and review store.
//!
//! Behaves like the database backend, including owner scoping, ordering, and
//! the achievement written on archive. State lives behind a single
//! `tokio::sync::RwLock`, so each call sees a consistent snapshot.

use super::{
    ItemChanges, ItemFilter, ItemStore, NewItem, NewReview, ReviewChanges, ReviewFilter,
    ReviewStore,
};
use crate::{
    core::achievement::money_saved,
    entities::{AchievementModel, ItemModel, ReviewModel, review::ReviewResponses},
    errors::Result,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct MemoryState {
    last_item_id: i64,
    last_review_id: i64,
    last_achievement_id: i64,
    items: BTreeMap<i64, ItemModel>,
    reviews: BTreeMap<i64, ReviewModel>,
    achievements: Vec<AchievementModel>,
}

fn owned_by(user_id: &str, owner: Option<&str>) -> bool {
    owner.is_none_or(|o| o == user_id)
}

/// Store that keeps everything in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Achievements recorded for one user, oldest first.
    pub async fn achievements(&self, user_id: &str) -> Vec<AchievementModel> {
        let state = self.state.read().await;
        state
            .achievements
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn create_item(&self, new_item: NewItem) -> Result<ItemModel> {
        let mut state = self.state.write().await;
        state.last_item_id += 1;
        let item = ItemModel {
            id: state.last_item_id,
            user_id: new_item.user_id,
            name: new_item.name,
            description: new_item.description,
            price: new_item.price,
            current_price: new_item.current_price,
            price_history: new_item.price_history,
            product_url: new_item.product_url,
            notes: new_item.notes,
            folder_id: new_item.folder_id,
            is_archived: false,
            archived_at: None,
            archived_reason: None,
            ai_features: new_item.ai_features,
            review_schedule: new_item.review_schedule,
            created_at: new_item.created_at,
        };
        state.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn get_item(&self, id: i64, owner: Option<&str>) -> Result<Option<ItemModel>> {
        let state = self.state.read().await;
        Ok(state
            .items
            .get(&id)
            .filter(|item| owned_by(&item.user_id, owner))
            .cloned())
    }

    async fn get_items(&self, filter: &ItemFilter) -> Result<Vec<ItemModel>> {
        let state = self.state.read().await;
        let mut items: Vec<ItemModel> = state
            .items
            .values()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect();
        items.sort_by_key(|item| (item.created_at, item.id));
        Ok(items)
    }

    async fn update_item(
        &self,
        id: i64,
        owner: Option<&str>,
        changes: ItemChanges,
    ) -> Result<Option<ItemModel>> {
        let mut state = self.state.write().await;
        let Some(item) = state
            .items
            .get_mut(&id)
            .filter(|item| owned_by(&item.user_id, owner))
        else {
            return Ok(None);
        };
        changes.apply(item);
        Ok(Some(item.clone()))
    }

    async fn archive_item(
        &self,
        id: i64,
        owner: Option<&str>,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ItemModel>> {
        let mut state = self.state.write().await;
        let Some(item) = state
            .items
            .get_mut(&id)
            .filter(|item| owned_by(&item.user_id, owner))
        else {
            return Ok(None);
        };
        if item.is_archived {
            return Ok(Some(item.clone()));
        }

        item.is_archived = true;
        item.archived_at = Some(now);
        item.archived_reason = Some(reason.to_string());
        let archived = item.clone();

        let record = money_saved(&archived, now);
        state.last_achievement_id += 1;
        let achievement = AchievementModel {
            id: state.last_achievement_id,
            user_id: record.user_id,
            item_id: record.item_id,
            achievement_type: record.achievement_type,
            title: record.title,
            description: record.description,
            value: record.value,
            unlocked_at: record.unlocked_at,
        };
        state.achievements.push(achievement);

        Ok(Some(archived))
    }

    async fn delete_item(&self, id: i64, owner: Option<&str>) -> Result<bool> {
        let mut state = self.state.write().await;
        let owned = state
            .items
            .get(&id)
            .is_some_and(|item| owned_by(&item.user_id, owner));
        if !owned {
            return Ok(false);
        }

        state.items.remove(&id);
        state.reviews.retain(|_, review| review.item_id != id);
        Ok(true)
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn create_review(&self, new_review: NewReview) -> Result<ReviewModel> {
        let mut state = self.state.write().await;
        state.last_review_id += 1;
        let review = ReviewModel {
            id: state.last_review_id,
            user_id: new_review.user_id,
            item_id: new_review.item_id,
            scheduled_for: new_review.scheduled_for,
            completed_at: None,
            review_type: new_review.review_type,
            is_completed: false,
            responses: ReviewResponses::default(),
            decision: None,
            created_at: new_review.created_at,
        };
        state.reviews.insert(review.id, review.clone());
        Ok(review)
    }

    async fn get_review(&self, id: i64, owner: Option<&str>) -> Result<Option<ReviewModel>> {
        let state = self.state.read().await;
        Ok(state
            .reviews
            .get(&id)
            .filter(|review| owned_by(&review.user_id, owner))
            .cloned())
    }

    async fn update_review(
        &self,
        id: i64,
        owner: Option<&str>,
        changes: ReviewChanges,
    ) -> Result<Option<ReviewModel>> {
        let mut state = self.state.write().await;
        let Some(review) = state
            .reviews
            .get_mut(&id)
            .filter(|review| owned_by(&review.user_id, owner))
        else {
            return Ok(None);
        };
        changes.apply(review);
        Ok(Some(review.clone()))
    }

    async fn get_reviews(&self, filter: &ReviewFilter) -> Result<Vec<ReviewModel>> {
        let state = self.state.read().await;
        let mut reviews: Vec<ReviewModel> = state
            .reviews
            .values()
            .filter(|review| filter.matches(review))
            .cloned()
            .collect();
        reviews.sort_by_key(|review| (review.scheduled_for, review.id));
        Ok(reviews)
    }
}
