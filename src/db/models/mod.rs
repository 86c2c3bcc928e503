//! Row models shared by repositories and services.

pub mod account;
pub mod item;
pub mod order;
pub mod review;

pub use account::{Account, PointHistory};
pub use item::Item;
pub use order::{Address, DeliveryStatus, Order, OrderItem, OrderReceipt, OrderStatus};
pub use review::Review;
