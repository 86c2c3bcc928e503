//! Service Layer
//!
//! Business workflows over the repositories: order creation, the delivery
//! state machine and its daily scheduler, and review gating. Services own
//! transaction boundaries; notifications are sent after commit and never
//! affect the outcome.

pub mod delivery;
pub mod error;
pub mod notification;
pub mod order_service;
pub mod review_service;
pub mod scheduler;

pub use delivery::{AdvanceOutcome, DeliveryService, SweepReport};
pub use error::{FulfillmentError, FulfillmentResult};
pub use notification::{LogSender, NotificationSender, NotifyError};
pub use order_service::{OrderCreateRequest, OrderService};
pub use review_service::{ReviewRequest, ReviewService};
pub use scheduler::DeliveryScheduler;
