//! Service-level error types.

use thiserror::Error;

use crate::db::models::{DeliveryStatus, OrderStatus};
use crate::db::repository::RepoError;

/// Errors surfaced by the fulfillment workflows.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    #[error("Order contains no items")]
    EmptyBasket,

    #[error("Insufficient stock for item {item_id}")]
    InsufficientStock { item_id: i64 },

    #[error("Insufficient point balance")]
    InsufficientPoints,

    #[error("Item {0} not found")]
    ItemNotFound(i64),

    #[error("Order {0} not found")]
    OrderNotFound(i64),

    #[error("Order item {0} not found")]
    OrderItemNotFound(i64),

    #[error("No account registered for {0}")]
    AccountNotFound(String),

    #[error("Order cannot be cancelled in state {order_status:?}/{delivery_status:?}")]
    InvalidCancellationState {
        order_status: OrderStatus,
        delivery_status: DeliveryStatus,
    },

    #[error("Delivery is not complete")]
    DeliveryNotComplete,

    #[error("Review window has expired")]
    ReviewWindowExpired,

    #[error("A review was already written for this order item")]
    DuplicateReview,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Database(#[from] RepoError),
}

impl From<sqlx::Error> for FulfillmentError {
    fn from(err: sqlx::Error) -> Self {
        FulfillmentError::Database(RepoError::from(err))
    }
}

impl From<validator::ValidationErrors> for FulfillmentError {
    fn from(errors: validator::ValidationErrors) -> Self {
        FulfillmentError::Validation(errors.to_string())
    }
}

/// Result type for service operations
pub type FulfillmentResult<T> = Result<T, FulfillmentError>;
