//! Review Model

use serde::{Deserialize, Serialize};

/// A product review, attached one-to-one to an order line item. Created only
/// after the review eligibility gate passes.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: i64,
    pub order_item_id: i64,
    pub account_id: i64,
    pub content: String,
    pub rating: i64,
    /// Stored file name when the review included a photo.
    pub photo_file: Option<String>,
    pub created_at: i64,
}
