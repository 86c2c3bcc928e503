//! Account and Point History Models

use serde::{Deserialize, Serialize};

/// Customer account. `points_balance` is the stored running sum of the
/// account's point history; the two are always written together in one
/// transaction and must never diverge.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub points_balance: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One append-only ledger entry. Positive `amount` = credit, negative = debit.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PointHistory {
    pub id: i64,
    pub account_id: i64,
    pub amount: i64,
    pub description: String,
    pub created_at: i64,
}
