//! Cart Repository
//!
//! Only the drain path is needed here; cart contents are written by the
//! storefront surface, which lives outside this crate.

use sqlx::{SqliteConnection, SqlitePool};

use super::RepoResult;

/// Removes one item from an account's cart, inside the caller's
/// transaction. Absent rows are fine; the cart may have changed since the
/// basket was built.
pub async fn remove_item(
    conn: &mut SqliteConnection,
    account_id: i64,
    item_id: i64,
) -> RepoResult<()> {
    sqlx::query("DELETE FROM cart_item WHERE account_id = ? AND item_id = ?")
        .bind(account_id)
        .bind(item_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// (item_id, quantity) pairs remaining in an account's cart.
pub async fn items_for_account(
    pool: &SqlitePool,
    account_id: i64,
) -> RepoResult<Vec<(i64, i64)>> {
    let rows = sqlx::query_as::<_, (i64, i64)>(
        "SELECT item_id, quantity FROM cart_item WHERE account_id = ? ORDER BY item_id",
    )
    .bind(account_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
