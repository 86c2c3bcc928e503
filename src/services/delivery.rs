//! Delivery Service
//!
//! The READY -> START -> DONE state machine plus cancellation. Each
//! transition is a guarded UPDATE in the repository, so running the sweep
//! twice (or concurrently) advances an order at most one step and sends
//! each customer mail at most once.

use std::sync::Arc;

use sqlx::SqlitePool;

use super::error::{FulfillmentError, FulfillmentResult};
use super::notification::NotificationSender;
use crate::db::models::{DeliveryStatus, Order};
use crate::db::repository::order;

/// What [`DeliveryService::advance`] did to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Started,
    Delivered,
    Unchanged,
}

/// Outcome of one sweep pass. Failures are per order; one broken order
/// never stops the rest of the queue.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub started: u64,
    pub delivered: u64,
    pub failures: Vec<SweepFailure>,
}

#[derive(Debug)]
pub struct SweepFailure {
    pub order_id: i64,
    pub reason: String,
}

pub struct DeliveryService {
    pool: SqlitePool,
    notifier: Arc<dyn NotificationSender>,
}

impl DeliveryService {
    pub fn new(pool: SqlitePool, notifier: Arc<dyn NotificationSender>) -> Self {
        Self { pool, notifier }
    }

    /// Moves an order one step along the pipeline. Orders already at DONE
    /// or CANCELLED, and orders another writer has advanced since `order`
    /// was read, are left unchanged.
    pub async fn advance(&self, order: &Order) -> FulfillmentResult<AdvanceOutcome> {
        let outcome = match order.delivery_status {
            DeliveryStatus::Ready => {
                if order::mark_started(&self.pool, order.id).await? {
                    self.notify(&order.email, "Your order has shipped", order.id)
                        .await;
                    AdvanceOutcome::Started
                } else {
                    AdvanceOutcome::Unchanged
                }
            }
            DeliveryStatus::Start => {
                if order::mark_delivered(&self.pool, order.id).await? {
                    self.notify(&order.email, "Your order has been delivered", order.id)
                        .await;
                    AdvanceOutcome::Delivered
                } else {
                    AdvanceOutcome::Unchanged
                }
            }
            DeliveryStatus::Done | DeliveryStatus::Cancelled => AdvanceOutcome::Unchanged,
        };
        Ok(outcome)
    }

    /// Cancels an order. Allowed only while it is still commercially live
    /// and the shipment has not started.
    pub async fn cancel(&self, order_id: i64) -> FulfillmentResult<Order> {
        if !order::mark_cancelled(&self.pool, order_id).await? {
            // Read after the miss so the reported pair reflects whatever
            // state actually blocked the cancel, not a stale snapshot.
            let current = order::find_by_id(&self.pool, order_id)
                .await?
                .ok_or(FulfillmentError::OrderNotFound(order_id))?;
            return Err(FulfillmentError::InvalidCancellationState {
                order_status: current.order_status,
                delivery_status: current.delivery_status,
            });
        }

        let cancelled = order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or(FulfillmentError::OrderNotFound(order_id))?;

        tracing::info!("Order {} cancelled", order_id);
        self.notify(&cancelled.email, "Your order has been cancelled", order_id)
            .await;

        Ok(cancelled)
    }

    /// One full sweep over every in-flight order. Per-order failures are
    /// logged and reported; the pass always runs to the end of the queue.
    pub async fn sweep_once(&self) -> FulfillmentResult<SweepReport> {
        let queue = order::find_sweepable(&self.pool).await?;
        let mut report = SweepReport::default();

        for order in &queue {
            match self.advance(order).await {
                Ok(AdvanceOutcome::Started) => report.started += 1,
                Ok(AdvanceOutcome::Delivered) => report.delivered += 1,
                Ok(AdvanceOutcome::Unchanged) => {}
                Err(e) => {
                    tracing::warn!("Sweep failed for order {}: {}", order.id, e);
                    report.failures.push(SweepFailure {
                        order_id: order.id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "Delivery sweep done: {} started, {} delivered, {} failed of {} in flight",
            report.started,
            report.delivered,
            report.failures.len(),
            queue.len()
        );
        Ok(report)
    }

    async fn notify(&self, recipient: &str, subject: &str, order_id: i64) {
        let body = format!("Update for order {order_id}.");
        if let Err(e) = self.notifier.send(recipient, subject, &body).await {
            tracing::warn!("Delivery mail for order {} failed: {}", order_id, e);
        }
    }
}
