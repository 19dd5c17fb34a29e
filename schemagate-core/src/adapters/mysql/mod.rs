//! MySQL/MariaDB adapter with connection pooling and schema introspection.
//!
//! # Module Structure
//! - `connection`: Connection string validation and pool construction
//! - `schema_collection`: `INFORMATION_SCHEMA` metadata queries
//! - `ddl`: Declared foreign-key actions from `SHOW CREATE TABLE`
//! - `sampling`: Bounded row sampling and value decoding
//!
//! # Security Guarantees
//! - All operations are read-only (SELECT/SHOW only)
//! - Pooled sessions run read-only transactions in UTC
//! - Connection strings are sanitized in error messages

pub mod connection;
pub mod ddl;
pub mod sampling;
pub mod schema_collection;


use super::SchemaInspector;
use crate::Result;
use crate::error::GatewayError;
use crate::models::{Column, ForeignKey, Index, Row};
use crate::referential::RuleMap;
use async_trait::async_trait;
use sqlx::MySqlPool;

pub use connection::{create_pool, normalize_connection_url, parse_pool_config, validate_connection_url};
pub use sampling::{decode_row, quote_identifier};

/// Schema inspector backed by a shared MySQL/MariaDB pool.
#[derive(Clone)]
pub struct MySqlInspector {
    pool: MySqlPool,
}

impl std::fmt::Debug for MySqlInspector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlInspector")
            .field("pool_size", &self.pool.size())
            .field("pool_idle", &self.pool.num_idle())
            .finish_non_exhaustive()
    }
}

impl MySqlInspector {
    /// Wraps an existing pool; the caller keeps ownership of its lifecycle.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Checks connectivity and `INFORMATION_SCHEMA` access.
    ///
    /// # Errors
    /// Returns error if the server is unreachable or metadata is not readable.
    pub async fn test_connection(&self) -> Result<()> {
        let connectivity_result: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(GatewayError::connection_failed)?;

        if connectivity_result != 1 {
            return Err(GatewayError::configuration(
                "Basic connectivity test failed: unexpected result",
            ));
        }

        let schema_access_test: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_SCHEMA = 'information_schema'",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| GatewayError::collection_failed("Cannot access INFORMATION_SCHEMA", e))?;

        if schema_access_test == 0 {
            return Err(GatewayError::configuration(
                "No access to INFORMATION_SCHEMA tables",
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl SchemaInspector for MySqlInspector {
    async fn current_schema(&self) -> Result<Option<String>> {
        schema_collection::current_schema(&self.pool).await
    }

    async fn table_names(&self, schema: &str) -> Result<Vec<String>> {
        schema_collection::table_names(&self.pool, schema).await
    }

    async fn view_names(&self, schema: &str) -> Result<Vec<String>> {
        schema_collection::view_names(&self.pool, schema).await
    }

    async fn table_comment(&self, schema: &str, table: &str) -> Result<String> {
        schema_collection::table_comment(&self.pool, schema, table).await
    }

    async fn columns(&self, schema: &str, table: &str) -> Result<Vec<Column>> {
        schema_collection::columns(&self.pool, schema, table).await
    }

    async fn primary_key(&self, schema: &str, table: &str) -> Result<Vec<String>> {
        schema_collection::primary_key(&self.pool, schema, table).await
    }

    async fn foreign_keys(&self, schema: &str, table: &str) -> Result<Vec<ForeignKey>> {
        schema_collection::foreign_keys(&self.pool, schema, table).await
    }

    async fn indexes(&self, schema: &str, table: &str) -> Result<Vec<Index>> {
        schema_collection::indexes(&self.pool, schema, table).await
    }

    async fn referential_rules(&self, schema: &str) -> Result<RuleMap> {
        schema_collection::referential_rules(&self.pool, schema).await
    }

    async fn sample_rows(
        &self,
        schema: &str,
        table: &str,
        columns: &[String],
        limit: u32,
    ) -> Result<Vec<Row>> {
        sampling::sample_rows(&self.pool, schema, table, columns, limit).await
    }
}
