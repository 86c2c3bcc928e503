//! Order Service
//!
//! Checkout: turns a validated basket into an order row plus line items in
//! one transaction, reserving stock and spending points atomically. Any
//! failed reservation or debit rolls the whole order back.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use sqlx::SqlitePool;
use validator::Validate;

use super::error::{FulfillmentError, FulfillmentResult};
use super::notification::NotificationSender;
use crate::db::models::{Address, DeliveryStatus, Order, OrderItem, OrderReceipt, OrderStatus};
use crate::db::repository::{account, cart, item, order};
use crate::utils::{Clock, snowflake_id};

/// Checkout request. `items` maps item id to quantity; guests order with a
/// bare email and no point spend.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OrderCreateRequest {
    #[validate(email)]
    pub email: String,
    pub items: BTreeMap<i64, i64>,
    pub address: Address,
    /// Remove the ordered items from the account's cart on success.
    pub cart_order: bool,
    #[validate(range(min = 0))]
    pub use_points: i64,
}

pub struct OrderService {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn NotificationSender>,
}

impl OrderService {
    pub fn new(
        pool: SqlitePool,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn NotificationSender>,
    ) -> Self {
        Self {
            pool,
            clock,
            notifier,
        }
    }

    /// Places an order. On success every line's stock has been reserved,
    /// the point debit (if any) is applied, and a confirmation mail has
    /// been attempted.
    pub async fn create_order(
        &self,
        request: OrderCreateRequest,
    ) -> FulfillmentResult<OrderReceipt> {
        request.validate()?;
        if request.items.is_empty() {
            return Err(FulfillmentError::EmptyBasket);
        }
        if request.items.values().any(|&qty| qty <= 0) {
            return Err(FulfillmentError::Validation(
                "Item quantities must be positive".into(),
            ));
        }

        let account = account::find_by_email(&self.pool, &request.email).await?;

        // Point spend needs an account and a sufficient balance. Checked
        // again by the conditional debit inside the transaction.
        if request.use_points > 0 {
            let account = account
                .as_ref()
                .ok_or(FulfillmentError::InsufficientPoints)?;
            if !account::is_available(&self.pool, account.id, request.use_points).await? {
                return Err(FulfillmentError::InsufficientPoints);
            }
        }

        // Preflight: existence first, then the advisory whole-basket stock
        // check. The reserve UPDATEs below remain the authoritative check.
        for &item_id in request.items.keys() {
            if item::find_by_id(&self.pool, item_id).await?.is_none() {
                return Err(FulfillmentError::ItemNotFound(item_id));
            }
        }
        if let Some(item_id) = item::check_sufficient(&self.pool, &request.items).await? {
            return Err(FulfillmentError::InsufficientStock { item_id });
        }

        let now = self.clock.now_millis();
        let order_row = Order {
            id: snowflake_id(),
            email: request.email.clone(),
            address: request.address.clone(),
            delivery_status: DeliveryStatus::Ready,
            order_status: OrderStatus::Order,
            order_date: now,
        };

        let mut tx = self.pool.begin().await?;
        order::insert_order(&mut tx, &order_row).await?;

        let mut lines = Vec::with_capacity(request.items.len());
        for (&item_id, &quantity) in &request.items {
            let catalog = item::find_by_id_tx(&mut tx, item_id)
                .await?
                .ok_or(FulfillmentError::ItemNotFound(item_id))?;
            if !item::reserve(&mut tx, item_id, quantity, now).await? {
                return Err(FulfillmentError::InsufficientStock { item_id });
            }
            let line = OrderItem {
                id: snowflake_id(),
                order_id: order_row.id,
                item_id,
                order_price: catalog.price,
                quantity,
                is_written: false,
            };
            order::insert_order_item(&mut tx, &line).await?;
            lines.push(line);
        }

        if request.cart_order {
            if let Some(account) = &account {
                for &item_id in request.items.keys() {
                    cart::remove_item(&mut tx, account.id, item_id).await?;
                }
            }
        }

        if request.use_points > 0 {
            // Presence checked above, and accounts are never deleted mid-flight.
            let account_id = account.as_ref().map(|a| a.id).unwrap_or_default();
            if !account::debit_tx(&mut tx, account_id, request.use_points, "order payment", now)
                .await?
            {
                return Err(FulfillmentError::InsufficientPoints);
            }
        }

        tx.commit().await?;

        let receipt = OrderReceipt::new(order_row, lines);
        tracing::info!(
            "Order {} created for {} ({} lines, total {})",
            receipt.order.id,
            receipt.order.email,
            receipt.items.len(),
            receipt.total_price
        );

        if let Err(e) = self
            .notifier
            .send(
                &receipt.order.email,
                "Your order has been placed",
                &format!(
                    "Order {} confirmed, total {} won.",
                    receipt.order.id, receipt.total_price
                ),
            )
            .await
        {
            tracing::warn!("Order confirmation mail failed: {}", e);
        }

        Ok(receipt)
    }

    /// Orders placed under `email`, newest first.
    pub async fn orders_by_email(&self, email: &str) -> FulfillmentResult<Vec<Order>> {
        Ok(order::find_by_email(&self.pool, email).await?)
    }

    /// One order with its line items.
    pub async fn order_detail(&self, order_id: i64) -> FulfillmentResult<OrderReceipt> {
        let order_row = order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or(FulfillmentError::OrderNotFound(order_id))?;
        let items = order::items_for_order(&self.pool, order_id).await?;
        Ok(OrderReceipt::new(order_row, items))
    }
}
