//! Data access layer.
//!
//! Every query runs through [`with_retry`], the single place the
//! reconnect-and-retry policy lives: a transient connection-class failure
//! is retried exactly once after the pool re-establishes, and a second
//! failure surfaces to the caller. Transactions are retried as whole units;
//! a failed attempt has already rolled back.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::future::Future;

pub mod accounts;
pub mod analytics;
pub mod customers;
pub mod orders;
pub mod products;
pub mod warehouses;

#[derive(Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn is_transient(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
    )
}

/// Run a datastore operation, retrying it once if the first attempt fails
/// with a connection-class error.
pub async fn with_retry<T, F, Fut>(op: F) -> Result<T, sqlx::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    match op().await {
        Err(err) if is_transient(&err) => {
            tracing::warn!(error = %err, "transient datastore failure, retrying once");
            op().await
        }
        result => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_once_on_transient_failure() {
        let attempts = AtomicU32::new(0);
        let result: Result<u32, _> = with_retry(|| {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(sqlx::Error::PoolTimedOut)
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn second_transient_failure_surfaces() {
        let attempts = AtomicU32::new(0);
        let result: Result<u32, _> = with_retry(|| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(sqlx::Error::PoolClosed) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn non_transient_failure_is_not_retried() {
        let attempts = AtomicU32::new(0);
        let result: Result<u32, _> = with_retry(|| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(sqlx::Error::RowNotFound) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
