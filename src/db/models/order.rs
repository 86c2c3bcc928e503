//! Order Models
//!
//! Delivery status is the fulfillment-lifecycle state (READY/START/DONE/
//! CANCELLED); order status is the commercial state (ORDER/CANCELED/
//! COMPLETED). Both are stored as TEXT and mutated only by the delivery
//! state machine after creation.

use serde::{Deserialize, Serialize};

/// Fulfillment lifecycle of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum DeliveryStatus {
    Ready,
    Start,
    Done,
    Cancelled,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Ready => "READY",
            DeliveryStatus::Start => "START",
            DeliveryStatus::Done => "DONE",
            DeliveryStatus::Cancelled => "CANCELLED",
        }
    }
}

/// Commercial state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Order,
    Canceled,
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Order => "ORDER",
            OrderStatus::Canceled => "CANCELED",
            OrderStatus::Completed => "COMPLETED",
        }
    }
}

/// Delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Address {
    pub city: String,
    pub street: String,
    pub zipcode: String,
}

/// A placed order. `order_date` is immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: i64,
    pub email: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub address: Address,
    pub delivery_status: DeliveryStatus,
    pub order_status: OrderStatus,
    pub order_date: i64,
}

/// One line of an order. `order_price` is the unit price captured at order
/// time, independent of later catalog changes. `is_written` flips exactly
/// once, on successful review submission.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub item_id: i64,
    pub order_price: i64,
    pub quantity: i64,
    pub is_written: bool,
}

impl OrderItem {
    /// Total for this line: snapshot price × quantity.
    pub fn total_price(&self) -> i64 {
        self.order_price * self.quantity
    }
}

/// An order together with its line items, as returned by order creation
/// and the detail read path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub total_price: i64,
}

impl OrderReceipt {
    pub fn new(order: Order, items: Vec<OrderItem>) -> Self {
        let total_price = items.iter().map(OrderItem::total_price).sum();
        Self {
            order,
            items,
            total_price,
        }
    }
}
