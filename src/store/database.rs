//! `SeaORM` implementation of the item and review stores.
//!
//! The stores are implemented directly on [`DatabaseConnection`], so any
//! connection the application opens can be handed to the scheduling core.
//! Multi-row writes (archive, delete) run inside a database transaction.

use super::{
    ItemChanges, ItemFilter, ItemStore, NewItem, NewReview, ReviewChanges, ReviewFilter,
    ReviewStore,
};
use crate::{
    core::achievement::money_saved,
    entities::{
        CustomQuestion, Item, Review, achievement, custom_question, item,
        review::{self, ReviewResponses},
    },
    errors::Result,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Select, Set, TransactionTrait, prelude::*};

fn scoped_item(id: i64, owner: Option<&str>) -> Select<Item> {
    let query = Item::find_by_id(id);
    match owner {
        Some(user_id) => query.filter(item::Column::UserId.eq(user_id)),
        None => query,
    }
}

fn scoped_review(id: i64, owner: Option<&str>) -> Select<Review> {
    let query = Review::find_by_id(id);
    match owner {
        Some(user_id) => query.filter(review::Column::UserId.eq(user_id)),
        None => query,
    }
}

fn apply_item_changes(active: &mut item::ActiveModel, changes: ItemChanges) {
    if let Some(name) = changes.name {
        active.name = Set(name);
    }
    if let Some(description) = changes.description {
        active.description = Set(description);
    }
    if let Some(price) = changes.price {
        active.price = Set(price);
    }
    if let Some(current_price) = changes.current_price {
        active.current_price = Set(current_price);
    }
    if let Some(price_history) = changes.price_history {
        active.price_history = Set(price_history);
    }
    if let Some(product_url) = changes.product_url {
        active.product_url = Set(product_url);
    }
    if let Some(notes) = changes.notes {
        active.notes = Set(notes);
    }
    if let Some(folder_id) = changes.folder_id {
        active.folder_id = Set(folder_id);
    }
    if let Some(ai_features) = changes.ai_features {
        active.ai_features = Set(ai_features);
    }
}

fn apply_review_changes(active: &mut review::ActiveModel, changes: ReviewChanges) {
    if let Some(is_completed) = changes.is_completed {
        active.is_completed = Set(is_completed);
    }
    if let Some(completed_at) = changes.completed_at {
        active.completed_at = Set(completed_at);
    }
    if let Some(responses) = changes.responses {
        active.responses = Set(responses);
    }
    if let Some(decision) = changes.decision {
        active.decision = Set(decision);
    }
}

#[async_trait]
impl ItemStore for DatabaseConnection {
    async fn create_item(&self, new_item: NewItem) -> Result<item::Model> {
        let model = item::ActiveModel {
            user_id: Set(new_item.user_id),
            name: Set(new_item.name),
            description: Set(new_item.description),
            price: Set(new_item.price),
            current_price: Set(new_item.current_price),
            price_history: Set(new_item.price_history),
            product_url: Set(new_item.product_url),
            notes: Set(new_item.notes),
            folder_id: Set(new_item.folder_id),
            is_archived: Set(false),
            archived_at: Set(None),
            archived_reason: Set(None),
            ai_features: Set(new_item.ai_features),
            review_schedule: Set(new_item.review_schedule),
            created_at: Set(new_item.created_at),
            ..Default::default()
        };
        model.insert(self).await.map_err(Into::into)
    }

    async fn get_item(&self, id: i64, owner: Option<&str>) -> Result<Option<item::Model>> {
        scoped_item(id, owner).one(self).await.map_err(Into::into)
    }

    async fn get_items(&self, filter: &ItemFilter) -> Result<Vec<item::Model>> {
        let mut query = Item::find();
        if let Some(user_id) = &filter.user_id {
            query = query.filter(item::Column::UserId.eq(user_id.as_str()));
        }
        if let Some(folder_id) = filter.folder_id {
            query = query.filter(item::Column::FolderId.eq(folder_id));
        }
        if let Some(is_archived) = filter.is_archived {
            query = query.filter(item::Column::IsArchived.eq(is_archived));
        }

        query
            .order_by_asc(item::Column::CreatedAt)
            .order_by_asc(item::Column::Id)
            .all(self)
            .await
            .map_err(Into::into)
    }

    async fn update_item(
        &self,
        id: i64,
        owner: Option<&str>,
        changes: ItemChanges,
    ) -> Result<Option<item::Model>> {
        let Some(existing) = scoped_item(id, owner).one(self).await? else {
            return Ok(None);
        };
        if changes.is_empty() {
            return Ok(Some(existing));
        }

        let mut active: item::ActiveModel = existing.into();
        apply_item_changes(&mut active, changes);
        Ok(Some(active.update(self).await?))
    }

    async fn archive_item(
        &self,
        id: i64,
        owner: Option<&str>,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<item::Model>> {
        let txn = self.begin().await?;

        let Some(existing) = scoped_item(id, owner).one(&txn).await? else {
            return Ok(None);
        };
        if existing.is_archived {
            return Ok(Some(existing));
        }

        let record = money_saved(&existing, now);
        let mut active: item::ActiveModel = existing.into();
        active.is_archived = Set(true);
        active.archived_at = Set(Some(now));
        active.archived_reason = Set(Some(reason.to_string()));
        let archived = active.update(&txn).await?;

        achievement::ActiveModel {
            user_id: Set(record.user_id),
            item_id: Set(record.item_id),
            achievement_type: Set(record.achievement_type),
            title: Set(record.title),
            description: Set(record.description),
            value: Set(record.value),
            unlocked_at: Set(record.unlocked_at),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(Some(archived))
    }

    async fn delete_item(&self, id: i64, owner: Option<&str>) -> Result<bool> {
        let txn = self.begin().await?;

        let Some(existing) = scoped_item(id, owner).one(&txn).await? else {
            return Ok(false);
        };

        // Children first; the foreign keys would reject the item delete otherwise.
        Review::delete_many()
            .filter(review::Column::ItemId.eq(existing.id))
            .exec(&txn)
            .await?;
        CustomQuestion::delete_many()
            .filter(custom_question::Column::ItemId.eq(existing.id))
            .exec(&txn)
            .await?;
        Item::delete_by_id(existing.id).exec(&txn).await?;

        txn.commit().await?;
        Ok(true)
    }
}

#[async_trait]
impl ReviewStore for DatabaseConnection {
    async fn create_review(&self, new_review: NewReview) -> Result<review::Model> {
        let model = review::ActiveModel {
            user_id: Set(new_review.user_id),
            item_id: Set(new_review.item_id),
            scheduled_for: Set(new_review.scheduled_for),
            completed_at: Set(None),
            review_type: Set(new_review.review_type),
            is_completed: Set(false),
            responses: Set(ReviewResponses::default()),
            decision: Set(None),
            created_at: Set(new_review.created_at),
            ..Default::default()
        };
        model.insert(self).await.map_err(Into::into)
    }

    async fn get_review(&self, id: i64, owner: Option<&str>) -> Result<Option<review::Model>> {
        scoped_review(id, owner).one(self).await.map_err(Into::into)
    }

    async fn update_review(
        &self,
        id: i64,
        owner: Option<&str>,
        changes: ReviewChanges,
    ) -> Result<Option<review::Model>> {
        let Some(existing) = scoped_review(id, owner).one(self).await? else {
            return Ok(None);
        };
        if changes.is_empty() {
            return Ok(Some(existing));
        }

        let mut active: review::ActiveModel = existing.into();
        apply_review_changes(&mut active, changes);
        Ok(Some(active.update(self).await?))
    }

    async fn get_reviews(&self, filter: &ReviewFilter) -> Result<Vec<review::Model>> {
        let mut query = Review::find();
        if let Some(user_id) = &filter.user_id {
            query = query.filter(review::Column::UserId.eq(user_id.as_str()));
        }
        if let Some(item_id) = filter.item_id {
            query = query.filter(review::Column::ItemId.eq(item_id));
        }
        if let Some(is_completed) = filter.is_completed {
            query = query.filter(review::Column::IsCompleted.eq(is_completed));
        }
        if let Some(review_type) = &filter.review_type {
            query = query.filter(review::Column::ReviewType.eq(review_type.as_str()));
        }

        query
            .order_by_asc(review::Column::ScheduledFor)
            .order_by_asc(review::Column::Id)
            .all(self)
            .await
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::entities::{Achievement, AchievementModel};
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_and_get_item() -> Result<()> {
        let db = setup_test_db().await?;
        let created = db.create_item(new_item("alice", "Headphones", 199.0)).await?;

        assert!(created.id > 0);
        assert_eq!(created.current_price, 199.0);
        assert_eq!(created.price_history.len(), 1);
        assert!(!created.is_archived);

        let found = db.get_item(created.id, Some("alice")).await?.unwrap();
        assert_eq!(found, created);

        // Scoped lookups never leak another user's item
        assert!(db.get_item(created.id, Some("bob")).await?.is_none());
        // System-wide lookups see everything
        assert!(db.get_item(created.id, None).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_get_items_filters() -> Result<()> {
        let db = setup_test_db().await?;
        let a = db.create_item(new_item("alice", "Lamp", 40.0)).await?;
        let b = db.create_item(new_item("alice", "Desk", 300.0)).await?;
        db.create_item(new_item("bob", "Chair", 90.0)).await?;
        db.archive_item(b.id, Some("alice"), "changed my mind", t0())
            .await?;

        let all = db.get_items(&ItemFilter::for_user("alice")).await?;
        assert_eq!(all.len(), 2);

        let active = db
            .get_items(&ItemFilter::for_user("alice").archived(false))
            .await?;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, a.id);

        let everyone = db.get_items(&ItemFilter::default()).await?;
        assert_eq!(everyone.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_item_missing_returns_none() -> Result<()> {
        let db = setup_test_db().await?;
        let changes = ItemChanges {
            name: Some("Renamed".to_string()),
            ..ItemChanges::default()
        };
        assert!(db.update_item(999, None, changes).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_archive_item_records_achievement_once() -> Result<()> {
        let db = setup_test_db().await?;
        let created = db.create_item(new_item("alice", "Watch", 250.0)).await?;

        let archived = db
            .archive_item(created.id, Some("alice"), "Not needed", t0())
            .await?
            .unwrap();
        assert!(archived.is_archived);
        assert_eq!(archived.archived_at, Some(t0()));
        assert_eq!(archived.archived_reason.as_deref(), Some("Not needed"));

        // Second archive is a no-op
        db.archive_item(created.id, Some("alice"), "Again", t0())
            .await?
            .unwrap();

        let achievements: Vec<AchievementModel> = Achievement::find().all(&db).await?;
        assert_eq!(achievements.len(), 1);
        assert_eq!(achievements[0].value, Some(250.0));
        assert_eq!(achievements[0].item_id, Some(created.id));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_item_cascades_to_reviews() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_test_item(&db, "alice", "Camera", &["1day", "1week"]).await?;

        assert_eq!(
            db.get_reviews(&ReviewFilter::default().for_item(created.item.id))
                .await?
                .len(),
            2
        );

        assert!(db.delete_item(created.item.id, Some("alice")).await?);
        assert!(db.get_item(created.item.id, None).await?.is_none());
        assert!(
            db.get_reviews(&ReviewFilter::default().for_item(created.item.id))
                .await?
                .is_empty()
        );

        // Deleting again reports absence
        assert!(!db.delete_item(created.item.id, Some("alice")).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_reviews_ordered_by_schedule() -> Result<()> {
        let db = setup_test_db().await?;
        let created =
            create_test_item(&db, "alice", "Bike", &["1year", "1day", "1month"]).await?;

        let reviews = db
            .get_reviews(&ReviewFilter::for_user("alice").for_item(created.item.id))
            .await?;
        let types: Vec<&str> = reviews.iter().map(|r| r.review_type.as_str()).collect();
        assert_eq!(types, vec!["1day", "1month", "1year"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_review_scoped_to_owner() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_test_item(&db, "alice", "Tent", &["1day"]).await?;
        let review_id = created.reviews[0].id;

        let changes = ReviewChanges::completed(ReviewResponses::default(), "keep", t0());
        assert!(
            db.update_review(review_id, Some("bob"), changes.clone())
                .await?
                .is_none()
        );

        let updated = db
            .update_review(review_id, Some("alice"), changes)
            .await?
            .unwrap();
        assert!(updated.is_completed);
        assert_eq!(updated.completed_at, Some(t0()));
        assert_eq!(updated.decision.as_deref(), Some("keep"));
        assert_eq!(updated.scheduled_for, created.reviews[0].scheduled_for);
        Ok(())
    }
}
