//! Review Repository

use sqlx::{SqliteConnection, SqlitePool};

use super::{RepoError, RepoResult};
use crate::db::models::Review;

const REVIEW_SELECT: &str =
    "SELECT id, order_item_id, account_id, content, rating, photo_file, created_at FROM review";

/// Inserts inside the caller's transaction. The UNIQUE constraint on
/// `order_item_id` backstops the `is_written` flag.
pub async fn insert(conn: &mut SqliteConnection, review: &Review) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO review (id, order_item_id, account_id, content, rating, photo_file, \
         created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(review.id)
    .bind(review.order_item_id)
    .bind(review.account_id)
    .bind(&review.content)
    .bind(review.rating)
    .bind(&review.photo_file)
    .bind(review.created_at)
    .execute(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => RepoError::Duplicate(
            format!("Review already exists for order item {}", review.order_item_id),
        ),
        other => RepoError::from(other),
    })?;
    Ok(())
}

pub async fn find_by_order_item(
    pool: &SqlitePool,
    order_item_id: i64,
) -> RepoResult<Option<Review>> {
    let row = sqlx::query_as::<_, Review>(&format!("{REVIEW_SELECT} WHERE order_item_id = ?"))
        .bind(order_item_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_account(pool: &SqlitePool, account_id: i64) -> RepoResult<Vec<Review>> {
    let rows = sqlx::query_as::<_, Review>(&format!(
        "{REVIEW_SELECT} WHERE account_id = ? ORDER BY created_at DESC, id DESC"
    ))
    .bind(account_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
