//! Database introspection seam and engine adapters.
//!
//! The catalog builder talks to the database only through [`SchemaInspector`],
//! which exposes one metadata query per concern. The MySQL/MariaDB adapter is
//! the production implementation; tests substitute an in-memory fake.
//!
//! # Module Structure
//! - `config`: Pool, gateway and catalog configuration
//! - `mysql`: MySQL/MariaDB adapter backed by a `sqlx` pool

use crate::Result;
use crate::models::{Column, ForeignKey, Index, Row};
use crate::referential::RuleMap;
use async_trait::async_trait;

pub mod config;
pub mod mysql;

pub use config::{CatalogOptions, GatewayConfig, PoolConfig};
pub use mysql::MySqlInspector;

/// Read-only metadata access used by the catalog builder.
///
/// Every method issues read-only statements only. Per-table methods fail
/// independently so that one unreadable table does not poison the rest of
/// the catalog.
///
/// # Object Safety
/// This trait is object-safe and is shared as `Arc<dyn SchemaInspector>`.
#[async_trait]
pub trait SchemaInspector: Send + Sync {
    /// The database the connection is currently using, if any.
    async fn current_schema(&self) -> Result<Option<String>>;

    /// Physical tables of a schema, in enumeration order.
    async fn table_names(&self, schema: &str) -> Result<Vec<String>>;

    /// Views of a schema, in enumeration order.
    async fn view_names(&self, schema: &str) -> Result<Vec<String>>;

    /// Table comment; empty when none is set.
    async fn table_comment(&self, schema: &str, table: &str) -> Result<String>;

    /// Columns in declaration order, with normalized types.
    ///
    /// # Errors
    /// Returns an error if the table does not exist or cannot be read.
    async fn columns(&self, schema: &str, table: &str) -> Result<Vec<Column>>;

    /// Primary-key column names in key order.
    async fn primary_key(&self, schema: &str, table: &str) -> Result<Vec<String>>;

    /// Foreign keys as reported by the primary metadata channel.
    ///
    /// Referential actions are only present when the table definition
    /// declares them explicitly.
    async fn foreign_keys(&self, schema: &str, table: &str) -> Result<Vec<ForeignKey>>;

    /// Secondary indexes, excluding the primary key.
    async fn indexes(&self, schema: &str, table: &str) -> Result<Vec<Index>>;

    /// ON UPDATE / ON DELETE rules for every constraint of the schema.
    async fn referential_rules(&self, schema: &str) -> Result<RuleMap>;

    /// Up to `limit` rows of `columns`, already normalized.
    async fn sample_rows(
        &self,
        schema: &str,
        table: &str,
        columns: &[String],
        limit: u32,
    ) -> Result<Vec<Row>>;
}
