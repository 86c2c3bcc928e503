//! Repository Module
//!
//! Thin data-access functions over the SQLite pool. Mutations of shared
//! counters (item stock, point balances) are single conditional UPDATEs
//! checked via `rows_affected`, never read-modify-write across round trips.
//! Functions taking `&mut SqliteConnection` are meant to run inside a
//! caller-owned transaction.

pub mod account;
pub mod cart;
pub mod item;
pub mod order;
pub mod review;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepoError::NotFound(err.to_string()),
            other => RepoError::Database(other.to_string()),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
