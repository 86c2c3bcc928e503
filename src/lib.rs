//! Coffeebean Fulfillment Engine
//!
//! In-process core of the coffeebean storefront backend. The surrounding
//! CRUD/HTTP layer (item catalog endpoints, auth, admin screens) calls into
//! this crate; nothing here owns a wire protocol.
//!
//! # Module structure
//!
//! ```text
//! src/
//! ├── core/          # Configuration
//! ├── db/            # SQLite pool, row models, repositories
//! ├── services/      # Order creation, delivery, scheduler, reviews
//! └── utils/         # Logging, clock, id generation
//! ```
//!
//! # Responsibilities
//!
//! - **Order creation** (`services::OrderService`): atomic basket checkout
//!   against finite stock and a spendable point balance.
//! - **Delivery lifecycle** (`services::DeliveryService`): the
//!   READY → START → DONE state machine plus cancellation.
//! - **Daily sweep** (`services::DeliveryScheduler`): advances every
//!   in-flight order once per day with per-order failure isolation.
//! - **Review gating** (`services::ReviewService`): time-windowed review
//!   eligibility and point rewards.

pub mod core;
pub mod db;
pub mod services;
pub mod utils;

pub use self::core::Config;
pub use db::DbService;
pub use services::{
    DeliveryScheduler, DeliveryService, FulfillmentError, FulfillmentResult, OrderService,
    ReviewService,
};
pub use utils::{Clock, SystemClock};
