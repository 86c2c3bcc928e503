//! Review Service
//!
//! Gates review submission on delivery completion and a time window
//! counted from the order date, then pays the reviewer's reward. The flag
//! flip, review row and point credits commit together.

use std::sync::Arc;

use chrono::Duration;
use serde::Deserialize;
use sqlx::SqlitePool;
use validator::Validate;

use super::error::{FulfillmentError, FulfillmentResult};
use crate::db::models::{DeliveryStatus, Order, OrderItem, Review};
use crate::db::repository::{account, order, review};
use crate::utils::{Clock, snowflake_id};

/// Days after the order date during which a review may be written.
/// The boundary instant itself is still inside the window.
pub const REVIEW_WINDOW_DAYS: i64 = 9;

/// Reward is this share of the line total (integer division).
const REVIEW_REWARD_DIVISOR: i64 = 10;

/// Flat extra credit for attaching a photo, paid as its own ledger entry.
pub const REVIEW_PHOTO_BONUS_POINTS: i64 = 2_000;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReviewRequest {
    #[validate(length(min = 1))]
    pub content: String,
    #[validate(range(min = 1, max = 5))]
    pub rating: i64,
    pub photo_file: Option<String>,
}

pub struct ReviewService {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl ReviewService {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// Checks whether a review could be written for this line right now.
    /// The error names the cause: `DeliveryNotComplete`,
    /// `ReviewWindowExpired` or `DuplicateReview`.
    pub async fn can_review(&self, order_item_id: i64) -> FulfillmentResult<()> {
        let (line, order_row) = self.load_line(order_item_id).await?;
        self.eligibility(&line, &order_row)
    }

    /// Writes the review and credits the reward. The reward is a tenth of
    /// the line total; a photo adds a flat bonus as a separate ledger
    /// entry. Exactly one review per order line, ever.
    pub async fn write_review(
        &self,
        order_item_id: i64,
        request: ReviewRequest,
    ) -> FulfillmentResult<Review> {
        request.validate()?;
        let (line, order_row) = self.load_line(order_item_id).await?;
        self.eligibility(&line, &order_row)?;

        let reviewer = account::find_by_email(&self.pool, &order_row.email)
            .await?
            .ok_or_else(|| FulfillmentError::AccountNotFound(order_row.email.clone()))?;

        let now = self.clock.now_millis();
        let review_row = Review {
            id: snowflake_id(),
            order_item_id,
            account_id: reviewer.id,
            content: request.content,
            rating: request.rating,
            photo_file: request.photo_file,
            created_at: now,
        };

        let mut tx = self.pool.begin().await?;
        if !order::mark_review_written(&mut tx, order_item_id).await? {
            return Err(FulfillmentError::DuplicateReview);
        }
        review::insert(&mut tx, &review_row).await?;

        let reward = line.total_price() / REVIEW_REWARD_DIVISOR;
        if reward > 0 {
            account::credit_tx(&mut tx, reviewer.id, reward, "review reward", now).await?;
        }
        if review_row.photo_file.is_some() {
            account::credit_tx(
                &mut tx,
                reviewer.id,
                REVIEW_PHOTO_BONUS_POINTS,
                "photo review bonus",
                now,
            )
            .await?;
        }
        tx.commit().await?;

        tracing::info!(
            "Review {} written for order item {} (reward {})",
            review_row.id,
            order_item_id,
            reward
        );
        Ok(review_row)
    }

    /// Lines under `email`'s orders that are currently reviewable.
    pub async fn reviewable_items(&self, email: &str) -> FulfillmentResult<Vec<OrderItem>> {
        let mut eligible = Vec::new();
        for order_row in order::find_by_email(&self.pool, email).await? {
            if self.window_open(&order_row).is_err()
                || order_row.delivery_status != DeliveryStatus::Done
            {
                continue;
            }
            for line in order::items_for_order(&self.pool, order_row.id).await? {
                if !line.is_written {
                    eligible.push(line);
                }
            }
        }
        Ok(eligible)
    }

    async fn load_line(&self, order_item_id: i64) -> FulfillmentResult<(OrderItem, Order)> {
        let line = order::find_order_item(&self.pool, order_item_id)
            .await?
            .ok_or(FulfillmentError::OrderItemNotFound(order_item_id))?;
        let order_row = order::find_by_id(&self.pool, line.order_id)
            .await?
            .ok_or(FulfillmentError::OrderNotFound(line.order_id))?;
        Ok((line, order_row))
    }

    fn eligibility(&self, line: &OrderItem, order_row: &Order) -> FulfillmentResult<()> {
        if order_row.delivery_status != DeliveryStatus::Done {
            return Err(FulfillmentError::DeliveryNotComplete);
        }
        self.window_open(order_row)?;
        if line.is_written {
            return Err(FulfillmentError::DuplicateReview);
        }
        Ok(())
    }

    fn window_open(&self, order_row: &Order) -> FulfillmentResult<()> {
        let window_end =
            order_row.order_date + Duration::days(REVIEW_WINDOW_DAYS).num_milliseconds();
        if self.clock.now_millis() > window_end {
            return Err(FulfillmentError::ReviewWindowExpired);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Address, OrderStatus};
    use crate::db::testing::{seed_account, seed_item, test_pool};
    use crate::utils::FixedClock;
    use chrono::{TimeZone, Utc};

    fn request(photo: Option<&str>) -> ReviewRequest {
        ReviewRequest {
            content: "Rich and balanced.".into(),
            rating: 5,
            photo_file: photo.map(String::from),
        }
    }

    /// One delivered order with a single line (price 10_000, quantity 2)
    /// for a registered account, placed at the clock's current instant.
    async fn seed_delivered_line(
        pool: &SqlitePool,
        email: &str,
        clock: &FixedClock,
    ) -> (OrderItem, i64) {
        let account = seed_account(pool, email, 0).await;
        let item = seed_item(pool, "House Blend", 10_000, 10).await;
        let order_row = Order {
            id: snowflake_id(),
            email: email.into(),
            address: Address {
                city: "Seoul".into(),
                street: "Teheran-ro 1".into(),
                zipcode: "06141".into(),
            },
            delivery_status: DeliveryStatus::Done,
            order_status: OrderStatus::Completed,
            order_date: clock.now_millis(),
        };
        let line = OrderItem {
            id: snowflake_id(),
            order_id: order_row.id,
            item_id: item.id,
            order_price: 10_000,
            quantity: 2,
            is_written: false,
        };
        let mut conn = pool.acquire().await.unwrap();
        order::insert_order(&mut conn, &order_row).await.unwrap();
        order::insert_order_item(&mut conn, &line).await.unwrap();
        (line, account.id)
    }

    fn fixed_clock() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn review_pays_a_tenth_of_the_line_total() {
        let pool = test_pool().await;
        let clock = Arc::new(fixed_clock());
        let svc = ReviewService::new(pool.clone(), clock.clone());
        let (line, account_id) = seed_delivered_line(&pool, "member@example.com", &clock).await;

        svc.can_review(line.id).await.unwrap();
        let written = svc.write_review(line.id, request(None)).await.unwrap();
        assert_eq!(written.order_item_id, line.id);

        // 10_000 * 2 / 10
        let balance = account::find_by_id(&pool, account_id)
            .await
            .unwrap()
            .unwrap()
            .points_balance;
        assert_eq!(balance, 2_000);

        let entries = account::history(&pool, account_id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].description, "review reward");

        let stored = review::find_by_order_item(&pool, line.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.rating, 5);
        assert!(matches!(
            svc.can_review(line.id).await.unwrap_err(),
            FulfillmentError::DuplicateReview
        ));
    }

    #[tokio::test]
    async fn photo_bonus_is_a_separate_ledger_entry() {
        let pool = test_pool().await;
        let clock = Arc::new(fixed_clock());
        let svc = ReviewService::new(pool.clone(), clock.clone());
        let (line, account_id) = seed_delivered_line(&pool, "member@example.com", &clock).await;

        svc.write_review(line.id, request(Some("beans.jpg")))
            .await
            .unwrap();

        let entries = account::history(&pool, account_id).await.unwrap();
        let descriptions: Vec<&str> = entries.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(descriptions, vec!["review reward", "photo review bonus"]);
        assert_eq!(entries[1].amount, REVIEW_PHOTO_BONUS_POINTS);

        let balance = account::find_by_id(&pool, account_id)
            .await
            .unwrap()
            .unwrap()
            .points_balance;
        assert_eq!(balance, 2_000 + REVIEW_PHOTO_BONUS_POINTS);
    }

    #[tokio::test]
    async fn second_review_is_rejected_without_a_second_credit() {
        let pool = test_pool().await;
        let clock = Arc::new(fixed_clock());
        let svc = ReviewService::new(pool.clone(), clock.clone());
        let (line, account_id) = seed_delivered_line(&pool, "member@example.com", &clock).await;

        svc.write_review(line.id, request(None)).await.unwrap();
        let err = svc.write_review(line.id, request(None)).await.unwrap_err();
        assert!(matches!(err, FulfillmentError::DuplicateReview));

        let entries = account::history(&pool, account_id).await.unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn window_boundary_is_inclusive() {
        let pool = test_pool().await;
        let clock = Arc::new(fixed_clock());
        let svc = ReviewService::new(pool.clone(), clock.clone());
        let (line, _) = seed_delivered_line(&pool, "member@example.com", &clock).await;

        clock.advance(Duration::days(REVIEW_WINDOW_DAYS));
        svc.can_review(line.id).await.unwrap();

        clock.advance(Duration::seconds(1));
        assert!(matches!(
            svc.can_review(line.id).await.unwrap_err(),
            FulfillmentError::ReviewWindowExpired
        ));
        let err = svc.write_review(line.id, request(None)).await.unwrap_err();
        assert!(matches!(err, FulfillmentError::ReviewWindowExpired));
    }

    #[tokio::test]
    async fn undelivered_line_cannot_be_reviewed() {
        let pool = test_pool().await;
        let clock = Arc::new(fixed_clock());
        let svc = ReviewService::new(pool.clone(), clock.clone());
        let (line, _) = seed_delivered_line(&pool, "member@example.com", &clock).await;

        sqlx::query("UPDATE orders SET delivery_status = 'START' WHERE id = ?")
            .bind(line.order_id)
            .execute(&pool)
            .await
            .unwrap();

        assert!(matches!(
            svc.can_review(line.id).await.unwrap_err(),
            FulfillmentError::DeliveryNotComplete
        ));
        let err = svc.write_review(line.id, request(None)).await.unwrap_err();
        assert!(matches!(err, FulfillmentError::DeliveryNotComplete));
    }

    #[tokio::test]
    async fn guest_reviewer_needs_an_account() {
        let pool = test_pool().await;
        let clock = Arc::new(fixed_clock());
        let svc = ReviewService::new(pool.clone(), clock.clone());

        // Delivered order under an email with no account row
        let item = seed_item(&pool, "House Blend", 10_000, 10).await;
        let order_row = Order {
            id: snowflake_id(),
            email: "guest@example.com".into(),
            address: Address {
                city: "Seoul".into(),
                street: "Teheran-ro 1".into(),
                zipcode: "06141".into(),
            },
            delivery_status: DeliveryStatus::Done,
            order_status: OrderStatus::Completed,
            order_date: clock.now_millis(),
        };
        let line = OrderItem {
            id: snowflake_id(),
            order_id: order_row.id,
            item_id: item.id,
            order_price: 10_000,
            quantity: 1,
            is_written: false,
        };
        let mut conn = pool.acquire().await.unwrap();
        order::insert_order(&mut conn, &order_row).await.unwrap();
        order::insert_order_item(&mut conn, &line).await.unwrap();
        drop(conn);

        let err = svc.write_review(line.id, request(None)).await.unwrap_err();
        assert!(matches!(err, FulfillmentError::AccountNotFound(_)));

        // Nothing was flipped; the line stays reviewable for later
        let stored = order::find_order_item(&pool, line.id).await.unwrap().unwrap();
        assert!(!stored.is_written);
    }

    #[tokio::test]
    async fn invalid_request_is_rejected_before_any_read() {
        let pool = test_pool().await;
        let svc = ReviewService::new(pool.clone(), Arc::new(fixed_clock()));

        let mut bad = request(None);
        bad.rating = 6;
        let err = svc.write_review(1, bad).await.unwrap_err();
        assert!(matches!(err, FulfillmentError::Validation(_)));

        let mut empty = request(None);
        empty.content.clear();
        let err = svc.write_review(1, empty).await.unwrap_err();
        assert!(matches!(err, FulfillmentError::Validation(_)));
    }

    #[tokio::test]
    async fn reviewable_items_lists_only_open_lines() {
        let pool = test_pool().await;
        let clock = Arc::new(fixed_clock());
        let svc = ReviewService::new(pool.clone(), clock.clone());
        let (first, _) = seed_delivered_line(&pool, "member@example.com", &clock).await;

        let eligible = svc.reviewable_items("member@example.com").await.unwrap();
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].id, first.id);

        svc.write_review(first.id, request(None)).await.unwrap();
        assert!(svc
            .reviewable_items("member@example.com")
            .await
            .unwrap()
            .is_empty());
    }
}
