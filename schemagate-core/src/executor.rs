//! Execution of vetted statements.
//!
//! The executor only ever receives a [`ValidatedQuery`] that the gatekeeper
//! allowed. Each call checks out one pooled connection, pins the session to
//! UTC, runs the statement and returns every row normalized. The connection
//! returns to the pool when it is dropped, on success and on error alike.

use crate::Result;
use crate::adapters::mysql::decode_row;
use crate::error::GatewayError;
use crate::models::{QueryResult, ValidatedQuery};
use sqlx::{Executor, MySqlPool};
use std::time::Duration;

/// Runs allowed statements against a shared pool.
#[derive(Clone)]
pub struct QueryExecutor {
    pool: MySqlPool,
}

impl std::fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("pool_size", &self.pool.size())
            .finish_non_exhaustive()
    }
}

impl QueryExecutor {
    /// Creates an executor over a pool whose sessions are already read-only.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn acquire_timeout(&self) -> Duration {
        self.pool.options().get_acquire_timeout()
    }

    /// Executes an allowed statement.
    ///
    /// # Errors
    /// - [`GatewayError::Configuration`] if the query was not allowed
    /// - [`GatewayError::PoolExhaustion`] if no connection frees up in time
    /// - [`GatewayError::Execution`] if the database rejects the statement
    pub async fn execute(&self, query: &ValidatedQuery) -> Result<QueryResult> {
        if !query.allowed {
            return Err(GatewayError::configuration(
                "refusing to execute a statement the gatekeeper rejected",
            ));
        }

        let start_time = std::time::Instant::now();
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| GatewayError::from_acquire(e, self.acquire_timeout()))?;

        (&mut *conn)
            .execute("SET time_zone = '+00:00'")
            .await
            .map_err(GatewayError::execution_failed)?;

        let rows = sqlx::query(&query.sanitized_text)
            .fetch_all(&mut *conn)
            .await
            .map_err(GatewayError::execution_failed)?;

        let rows: Vec<_> = rows.iter().map(decode_row).collect();
        tracing::info!(
            "Query returned {} rows in {:.2}s",
            rows.len(),
            start_time.elapsed().as_secs_f64()
        );

        Ok(QueryResult::new(query.sanitized_text.clone(), rows))
    }
}
