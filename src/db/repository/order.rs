//! Order Repository
//!
//! Delivery-state transitions are guarded UPDATEs keyed on the current
//! (delivery_status, order_status) pair, so concurrent sweeps or cancels
//! apply each transition at most once.

use sqlx::{SqliteConnection, SqlitePool};

use super::RepoResult;
use crate::db::models::{DeliveryStatus, Order, OrderItem, OrderStatus};

const ORDER_SELECT: &str = "SELECT id, email, city, street, zipcode, \
     delivery_status, order_status, order_date FROM orders";

const ORDER_ITEM_SELECT: &str =
    "SELECT id, order_id, item_id, order_price, quantity, is_written FROM order_item";

pub async fn insert_order(conn: &mut SqliteConnection, order: &Order) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO orders (id, email, city, street, zipcode, delivery_status, \
         order_status, order_date) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )
    .bind(order.id)
    .bind(&order.email)
    .bind(&order.address.city)
    .bind(&order.address.street)
    .bind(&order.address.zipcode)
    .bind(order.delivery_status)
    .bind(order.order_status)
    .bind(order.order_date)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn insert_order_item(conn: &mut SqliteConnection, item: &OrderItem) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO order_item (id, order_id, item_id, order_price, quantity, is_written) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(item.id)
    .bind(item.order_id)
    .bind(item.item_id)
    .bind(item.order_price)
    .bind(item.quantity)
    .bind(item.is_written)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let row = sqlx::query_as::<_, Order>(&format!("{ORDER_SELECT} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// All orders placed under `email`, newest first.
pub async fn find_by_email(pool: &SqlitePool, email: &str) -> RepoResult<Vec<Order>> {
    let rows = sqlx::query_as::<_, Order>(&format!(
        "{ORDER_SELECT} WHERE email = ? ORDER BY order_date DESC, id DESC"
    ))
    .bind(email)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn items_for_order(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let rows = sqlx::query_as::<_, OrderItem>(&format!(
        "{ORDER_ITEM_SELECT} WHERE order_id = ? ORDER BY id"
    ))
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_order_item(pool: &SqlitePool, id: i64) -> RepoResult<Option<OrderItem>> {
    let row = sqlx::query_as::<_, OrderItem>(&format!("{ORDER_ITEM_SELECT} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Orders the daily sweep must touch: still commercially live and not yet
/// delivered. Oldest first so long-waiting orders move before fresh ones.
pub async fn find_sweepable(pool: &SqlitePool) -> RepoResult<Vec<Order>> {
    let rows = sqlx::query_as::<_, Order>(&format!(
        "{ORDER_SELECT} WHERE order_status = 'ORDER' \
         AND delivery_status IN ('READY', 'START') ORDER BY order_date, id"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// READY -> START, only while the order is still commercially live.
/// Returns whether this call performed the transition.
pub async fn mark_started(pool: &SqlitePool, order_id: i64) -> RepoResult<bool> {
    transition(
        pool,
        order_id,
        DeliveryStatus::Ready,
        DeliveryStatus::Start,
        None,
    )
    .await
}

/// START -> DONE. Delivery completion also closes the commercial state.
pub async fn mark_delivered(pool: &SqlitePool, order_id: i64) -> RepoResult<bool> {
    transition(
        pool,
        order_id,
        DeliveryStatus::Start,
        DeliveryStatus::Done,
        Some(OrderStatus::Completed),
    )
    .await
}

/// READY -> CANCELLED, with the commercial state flipped to CANCELED in the
/// same statement. Fails (returns `false`) once the shipment has started.
pub async fn mark_cancelled(pool: &SqlitePool, order_id: i64) -> RepoResult<bool> {
    transition(
        pool,
        order_id,
        DeliveryStatus::Ready,
        DeliveryStatus::Cancelled,
        Some(OrderStatus::Canceled),
    )
    .await
}

async fn transition(
    pool: &SqlitePool,
    order_id: i64,
    from: DeliveryStatus,
    to: DeliveryStatus,
    close_as: Option<OrderStatus>,
) -> RepoResult<bool> {
    let result = match close_as {
        Some(status) => {
            sqlx::query(
                "UPDATE orders SET delivery_status = ?1, order_status = ?2 \
                 WHERE id = ?3 AND delivery_status = ?4 AND order_status = 'ORDER'",
            )
            .bind(to)
            .bind(status)
            .bind(order_id)
            .bind(from)
            .execute(pool)
            .await?
        }
        None => {
            sqlx::query(
                "UPDATE orders SET delivery_status = ?1 \
                 WHERE id = ?2 AND delivery_status = ?3 AND order_status = 'ORDER'",
            )
            .bind(to)
            .bind(order_id)
            .bind(from)
            .execute(pool)
            .await?
        }
    };
    Ok(result.rows_affected() > 0)
}

/// Flips the line's review flag, exactly once. Returns `false` when a review
/// has already been written for this line.
pub async fn mark_review_written(conn: &mut SqliteConnection, order_item_id: i64) -> RepoResult<bool> {
    let result = sqlx::query("UPDATE order_item SET is_written = 1 WHERE id = ? AND is_written = 0")
        .bind(order_item_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
