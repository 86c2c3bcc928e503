//! Item Repository — catalog lookup and the stock ledger.

use sqlx::{SqliteConnection, SqlitePool};
use std::collections::BTreeMap;

use super::RepoResult;
use crate::db::models::Item;
use crate::utils::snowflake_id;

const ITEM_SELECT: &str =
    "SELECT id, name, price, stock_quantity, description, created_at, updated_at FROM item";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Item>> {
    let row = sqlx::query_as::<_, Item>(&format!("{ITEM_SELECT} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Same lookup on a transaction connection, for price snapshots taken inside
/// the order-creation unit of work.
pub async fn find_by_id_tx(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Item>> {
    let row = sqlx::query_as::<_, Item>(&format!("{ITEM_SELECT} WHERE id = ?"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn create(
    pool: &SqlitePool,
    name: &str,
    price: i64,
    stock_quantity: i64,
    description: Option<&str>,
    now: i64,
) -> RepoResult<Item> {
    let id = snowflake_id();
    sqlx::query(
        "INSERT INTO item (id, name, price, stock_quantity, description, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
    )
    .bind(id)
    .bind(name)
    .bind(price)
    .bind(stock_quantity)
    .bind(description)
    .bind(now)
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| super::RepoError::Database("Failed to create item".into()))
}

/// Advisory pre-flight check over a whole basket. Returns the first item
/// whose current stock cannot cover the requested quantity (missing rows
/// count as insufficient), or `None` when the whole basket is satisfiable.
/// Not safe against concurrent reservations — the authoritative floor check
/// is [`reserve`].
pub async fn check_sufficient(
    pool: &SqlitePool,
    basket: &BTreeMap<i64, i64>,
) -> RepoResult<Option<i64>> {
    for (&item_id, &quantity) in basket {
        let stock: Option<(i64,)> =
            sqlx::query_as("SELECT stock_quantity FROM item WHERE id = ?")
                .bind(item_id)
                .fetch_optional(pool)
                .await?;
        match stock {
            Some((available,)) if available >= quantity => {}
            _ => return Ok(Some(item_id)),
        }
    }
    Ok(None)
}

/// Atomically decrement one item's stock by `quantity`.
///
/// The floor check and the decrement are a single conditional UPDATE;
/// returns `false` (no effect) when current stock is below `quantity`.
pub async fn reserve(
    conn: &mut SqliteConnection,
    item_id: i64,
    quantity: i64,
    now: i64,
) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE item SET stock_quantity = stock_quantity - ?1, updated_at = ?2 \
         WHERE id = ?3 AND stock_quantity >= ?1",
    )
    .bind(quantity)
    .bind(now)
    .bind(item_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}
