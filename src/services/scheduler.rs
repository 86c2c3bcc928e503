//! Delivery Scheduler
//!
//! Long-running task that fires one delivery sweep per day at the
//! configured local time, until the shutdown token is cancelled.

use std::sync::Arc;

use chrono::{Local, NaiveTime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::delivery::DeliveryService;
use crate::utils::{Clock, duration_until_next_trigger};

pub struct DeliveryScheduler {
    delivery: Arc<DeliveryService>,
    trigger: NaiveTime,
    shutdown: CancellationToken,
    clock: Arc<dyn Clock>,
}

impl DeliveryScheduler {
    pub fn new(
        delivery: Arc<DeliveryService>,
        trigger: NaiveTime,
        shutdown: CancellationToken,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            delivery,
            trigger,
            shutdown,
            clock,
        }
    }

    /// Spawns the daily loop onto the runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Runs until shutdown. A failed sweep is logged and the loop waits for
    /// the next day's trigger; it never exits on error.
    pub async fn run(self) {
        tracing::info!("Delivery scheduler started (daily at {})", self.trigger);
        loop {
            let now = self.clock.now().with_timezone(&Local);
            let wait = duration_until_next_trigger(now, self.trigger);
            tracing::debug!("Next delivery sweep in {}s", wait.as_secs());

            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Delivery scheduler stopped");
                    return;
                }
                _ = tokio::time::sleep(wait) => {
                    match self.delivery.sweep_once().await {
                        Ok(report) => tracing::info!(
                            "Scheduled sweep: {} started, {} delivered, {} failed",
                            report.started,
                            report.delivered,
                            report.failures.len()
                        ),
                        Err(e) => tracing::error!("Scheduled sweep failed: {}", e),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Address, DeliveryStatus, Order, OrderStatus};
    use crate::db::repository::order;
    use crate::db::testing::test_pool;
    use crate::services::notification::testing::RecordingSender;
    use crate::utils::{SystemClock, now_millis, snowflake_id};
    use sqlx::SqlitePool;
    use std::time::Duration;

    async fn seed_order(pool: &SqlitePool) -> Order {
        let row = Order {
            id: snowflake_id(),
            email: "buyer@example.com".into(),
            address: Address {
                city: "Seoul".into(),
                street: "Teheran-ro 1".into(),
                zipcode: "06141".into(),
            },
            delivery_status: DeliveryStatus::Ready,
            order_status: OrderStatus::Order,
            order_date: now_millis(),
        };
        let mut conn = pool.acquire().await.unwrap();
        order::insert_order(&mut conn, &row).await.unwrap();
        row
    }

    #[tokio::test(start_paused = true)]
    async fn fires_a_sweep_once_the_trigger_time_passes() {
        let pool = test_pool().await;
        let placed = seed_order(&pool).await;
        let delivery = Arc::new(DeliveryService::new(
            pool.clone(),
            Arc::new(RecordingSender::default()),
        ));

        let shutdown = CancellationToken::new();
        let scheduler = DeliveryScheduler::new(
            delivery,
            NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            shutdown.clone(),
            Arc::new(SystemClock),
        );
        let handle = scheduler.spawn();

        // The next trigger is at most 24h away
        tokio::time::advance(Duration::from_secs(25 * 3600)).await;

        // The sweep's database work runs off the paused clock; poll until
        // the transition lands
        let mut status = DeliveryStatus::Ready;
        for _ in 0..1000 {
            status = order::find_by_id(&pool, placed.id)
                .await
                .unwrap()
                .unwrap()
                .delivery_status;
            if status != DeliveryStatus::Ready {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(status, DeliveryStatus::Start);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_stops_the_loop_before_the_trigger() {
        let pool = test_pool().await;
        let delivery = Arc::new(DeliveryService::new(
            pool.clone(),
            Arc::new(RecordingSender::default()),
        ));

        let shutdown = CancellationToken::new();
        let scheduler = DeliveryScheduler::new(
            delivery,
            NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            shutdown.clone(),
            Arc::new(SystemClock),
        );
        let handle = scheduler.spawn();

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("scheduler exits on shutdown")
            .unwrap();
    }
}
