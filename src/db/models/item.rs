//! Item Model

use serde::{Deserialize, Serialize};

/// Catalog item. `price` is in integer minor-currency units.
///
/// `stock_quantity` is never negative; it is mutated only through the
/// conditional decrement in `repository::item::reserve`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub stock_quantity: i64,
    pub description: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}
