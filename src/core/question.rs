//! Custom reflection questions a user attaches to an item's checkpoints.

use crate::{
    core::schedule::IntervalLabel,
    entities::{CustomQuestion, CustomQuestionModel, Item, custom_question, item},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Adds a question to one of the user's items for checkpoints of `review_type`.
///
/// Returns `Ok(None)` when the item does not exist for `user_id`.
///
/// # Errors
/// Returns an error if:
/// - The question text is empty
/// - `review_type` is not a known interval label
/// - A database operation fails
pub async fn create_question(
    db: &DatabaseConnection,
    user_id: &str,
    item_id: i64,
    question: &str,
    review_type: &str,
    now: DateTime<Utc>,
) -> Result<Option<CustomQuestionModel>> {
    let question = question.trim();
    if question.is_empty() {
        return Err(Error::Validation {
            message: "Question cannot be empty".to_string(),
        });
    }
    let label: IntervalLabel = review_type.parse()?;

    let owned = Item::find_by_id(item_id)
        .filter(item::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .is_some();
    if !owned {
        return Ok(None);
    }

    let model = custom_question::ActiveModel {
        user_id: Set(user_id.to_string()),
        item_id: Set(item_id),
        question: Set(question.to_string()),
        review_type: Set(label.as_str().to_string()),
        created_at: Set(now),
        ..Default::default()
    };
    Ok(Some(model.insert(db).await?))
}

/// Questions on one item, oldest first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_questions(
    db: &DatabaseConnection,
    user_id: &str,
    item_id: i64,
) -> Result<Vec<CustomQuestionModel>> {
    CustomQuestion::find()
        .filter(custom_question::Column::UserId.eq(user_id))
        .filter(custom_question::Column::ItemId.eq(item_id))
        .order_by_asc(custom_question::Column::CreatedAt)
        .order_by_asc(custom_question::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Questions on one item that apply to checkpoints of `label`.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_questions_for_review(
    db: &DatabaseConnection,
    user_id: &str,
    item_id: i64,
    label: IntervalLabel,
) -> Result<Vec<CustomQuestionModel>> {
    CustomQuestion::find()
        .filter(custom_question::Column::UserId.eq(user_id))
        .filter(custom_question::Column::ItemId.eq(item_id))
        .filter(custom_question::Column::ReviewType.eq(label.as_str()))
        .order_by_asc(custom_question::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes a question. Returns `false` when it does not exist for `user_id`.
///
/// # Errors
/// Returns an error if the database operation fails.
pub async fn delete_question(db: &DatabaseConnection, user_id: &str, question_id: i64) -> Result<bool> {
    let result = CustomQuestion::delete_many()
        .filter(custom_question::Column::Id.eq(question_id))
        .filter(custom_question::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}
