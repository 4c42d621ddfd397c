//! Achievement records - Written when a user decides against a purchase.

use crate::{
    entities::{Achievement, AchievementModel, ItemModel, achievement},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, prelude::*};

/// Achievement type recorded when an item is archived
pub const MONEY_SAVED: &str = "money_saved";

/// An achievement ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct NewAchievement {
    pub user_id: String,
    pub item_id: Option<i64>,
    pub achievement_type: String,
    pub title: String,
    pub description: String,
    pub value: Option<f64>,
    pub unlocked_at: DateTime<Utc>,
}

/// The money-saved achievement for archiving `item` at `now`.
///
/// The saved amount is the item's original price, not its tracked price.
#[must_use]
pub fn money_saved(item: &ItemModel, now: DateTime<Utc>) -> NewAchievement {
    NewAchievement {
        user_id: item.user_id.clone(),
        item_id: Some(item.id),
        achievement_type: MONEY_SAVED.to_string(),
        title: "Mindful Decision".to_string(),
        description: format!(
            "You saved ${:.2} by thoughtfully deciding not to purchase {}",
            item.price, item.name
        ),
        value: Some(item.price),
        unlocked_at: now,
    }
}

/// Retrieves a user's achievements, newest first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_achievements(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Vec<AchievementModel>> {
    Achievement::find()
        .filter(achievement::Column::UserId.eq(user_id))
        .order_by_desc(achievement::Column::UnlockedAt)
        .order_by_desc(achievement::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Total money saved across a user's achievements.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn total_saved(db: &DatabaseConnection, user_id: &str) -> Result<f64> {
    Ok(get_achievements(db, user_id)
        .await?
        .iter()
        .filter(|a| a.achievement_type == MONEY_SAVED)
        .filter_map(|a| a.value)
        .sum())
}
