//! Account Repository — lookup plus the point ledger.
//!
//! Every balance change writes the conditional balance UPDATE and exactly
//! one signed history row in the same transaction, so the stored balance
//! and the history sum cannot diverge.

use sqlx::{SqliteConnection, SqlitePool};

use super::{RepoError, RepoResult};
use crate::db::models::{Account, PointHistory};
use crate::utils::snowflake_id;

const ACCOUNT_SELECT: &str =
    "SELECT id, email, name, points_balance, created_at, updated_at FROM account";

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> RepoResult<Option<Account>> {
    let row = sqlx::query_as::<_, Account>(&format!("{ACCOUNT_SELECT} WHERE email = ?"))
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Account>> {
    let row = sqlx::query_as::<_, Account>(&format!("{ACCOUNT_SELECT} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(
    pool: &SqlitePool,
    email: &str,
    name: Option<&str>,
    now: i64,
) -> RepoResult<Account> {
    let id = snowflake_id();
    sqlx::query(
        "INSERT INTO account (id, email, name, points_balance, created_at, updated_at) \
         VALUES (?1, ?2, ?3, 0, ?4, ?4)",
    )
    .bind(id)
    .bind(email)
    .bind(name)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            RepoError::Duplicate(format!("Account {email} already exists"))
        }
        other => RepoError::from(other),
    })?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create account".into()))
}

pub async fn points_balance(pool: &SqlitePool, account_id: i64) -> RepoResult<i64> {
    let row: (i64,) = sqlx::query_as("SELECT points_balance FROM account WHERE id = ?")
        .bind(account_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Account {account_id} not found")))?;
    Ok(row.0)
}

/// True iff `amount` does not exceed the account's current balance.
/// Advisory only; the authoritative floor check happens inside [`debit_tx`].
pub async fn is_available(pool: &SqlitePool, account_id: i64, amount: i64) -> RepoResult<bool> {
    match points_balance(pool, account_id).await {
        Ok(balance) => Ok(balance >= amount),
        Err(RepoError::NotFound(_)) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Subtract `amount` and append one negative history entry, inside the
/// caller's transaction. Returns `false` (no effect at all) when the balance
/// is below `amount` at the moment of the update.
pub async fn debit_tx(
    conn: &mut SqliteConnection,
    account_id: i64,
    amount: i64,
    reason: &str,
    now: i64,
) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE account SET points_balance = points_balance - ?1, updated_at = ?2 \
         WHERE id = ?3 AND points_balance >= ?1",
    )
    .bind(amount)
    .bind(now)
    .bind(account_id)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 0 {
        return Ok(false);
    }
    insert_history(conn, account_id, -amount, reason, now).await?;
    Ok(true)
}

/// Add `amount` and append one positive history entry, inside the caller's
/// transaction.
pub async fn credit_tx(
    conn: &mut SqliteConnection,
    account_id: i64,
    amount: i64,
    reason: &str,
    now: i64,
) -> RepoResult<()> {
    let result = sqlx::query(
        "UPDATE account SET points_balance = points_balance + ?1, updated_at = ?2 WHERE id = ?3",
    )
    .bind(amount)
    .bind(now)
    .bind(account_id)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Account {account_id} not found")));
    }
    insert_history(conn, account_id, amount, reason, now).await
}

/// Standalone debit in its own transaction.
pub async fn debit(
    pool: &SqlitePool,
    account_id: i64,
    amount: i64,
    reason: &str,
    now: i64,
) -> RepoResult<bool> {
    let mut tx = pool.begin().await?;
    let applied = debit_tx(&mut tx, account_id, amount, reason, now).await?;
    tx.commit().await?;
    Ok(applied)
}

/// Standalone credit in its own transaction.
pub async fn credit(
    pool: &SqlitePool,
    account_id: i64,
    amount: i64,
    reason: &str,
    now: i64,
) -> RepoResult<()> {
    let mut tx = pool.begin().await?;
    credit_tx(&mut tx, account_id, amount, reason, now).await?;
    tx.commit().await?;
    Ok(())
}

/// Full ledger for an account, oldest first.
pub async fn history(pool: &SqlitePool, account_id: i64) -> RepoResult<Vec<PointHistory>> {
    let rows = sqlx::query_as::<_, PointHistory>(
        "SELECT id, account_id, amount, description, created_at FROM point_history \
         WHERE account_id = ? ORDER BY created_at, id",
    )
    .bind(account_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

async fn insert_history(
    conn: &mut SqliteConnection,
    account_id: i64,
    amount: i64,
    reason: &str,
    now: i64,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO point_history (id, account_id, amount, description, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(snowflake_id())
    .bind(account_id)
    .bind(amount)
    .bind(reason)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}
