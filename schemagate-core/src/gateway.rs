//! Tool surface consumed by an upstream query generator.
//!
//! [`Gateway`] bundles a schema inspector, a query executor and the policy in
//! [`GatewayConfig`]. Every entry point that runs SQL passes it through the
//! [`Gatekeeper`] first, so a rejected statement never checks out a
//! connection.
//!
//! # Example
//! ```rust,no_run
//! use schemagate_core::adapters::{GatewayConfig, MySqlInspector, PoolConfig};
//! use schemagate_core::gateway::Gateway;
//!
//! # async fn example() -> schemagate_core::Result<()> {
//! let inspector = MySqlInspector::connect("mysql://reader@localhost/hr", &PoolConfig::default())?;
//! let config = GatewayConfig::new().with_allowed_tables(["candidates", "interviews"]);
//! let gateway = Gateway::from_pool(inspector.pool().clone(), config)?;
//!
//! let result = gateway.run_query("SELECT * FROM candidates").await?;
//! assert!(result.sql.ends_with("LIMIT 200"));
//! # Ok(())
//! # }
//! ```

use crate::Result;
use crate::adapters::{CatalogOptions, GatewayConfig, MySqlInspector, SchemaInspector};
use crate::catalog::{build_catalog, resolve_schema};
use crate::error::GatewayError;
use crate::executor::QueryExecutor;
use crate::gatekeeper::Gatekeeper;
use crate::models::{Catalog, QueryResult};
use crate::render;
use sqlx::MySqlPool;
use std::sync::Arc;

/// Catalog, listing and gated query operations over one shared pool.
#[derive(Clone)]
pub struct Gateway {
    inspector: Arc<dyn SchemaInspector>,
    executor: QueryExecutor,
    gatekeeper: Gatekeeper,
    config: GatewayConfig,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("executor", &self.executor)
            .field("gatekeeper", &self.gatekeeper)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Creates a gateway from its parts.
    ///
    /// # Errors
    /// Returns error if the configuration is invalid.
    pub fn new(
        inspector: Arc<dyn SchemaInspector>,
        executor: QueryExecutor,
        config: GatewayConfig,
    ) -> Result<Self> {
        config.validate()?;
        let gatekeeper = Gatekeeper::new(config.allowed_tables.clone(), config.default_limit);
        Ok(Self {
            inspector,
            executor,
            gatekeeper,
            config,
        })
    }

    /// Creates a gateway whose inspector and executor share `pool`.
    ///
    /// # Errors
    /// Returns error if the configuration is invalid.
    pub fn from_pool(pool: MySqlPool, config: GatewayConfig) -> Result<Self> {
        let inspector = Arc::new(MySqlInspector::new(pool.clone()));
        Self::new(inspector, QueryExecutor::new(pool), config)
    }

    /// The policy this gateway enforces.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The gatekeeper built from the policy.
    pub fn gatekeeper(&self) -> &Gatekeeper {
        &self.gatekeeper
    }

    /// Physical tables the generator may use, sorted alphabetically.
    ///
    /// # Errors
    /// Returns error if the schema cannot be resolved or enumerated.
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        let schema = resolve_schema(self.inspector.as_ref(), self.config.schema.as_deref()).await?;
        let mut names: Vec<String> = self
            .inspector
            .table_names(&schema)
            .await?
            .into_iter()
            .filter(|name| self.gatekeeper.is_allowed(name))
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    /// Catalog served to the generator: always masked, restricted to the
    /// allow-list, sampled per policy.
    ///
    /// # Errors
    /// Returns error if the schema cannot be resolved.
    pub async fn get_catalog(&self) -> Result<Catalog> {
        let options = CatalogOptions::new()
            .with_masking(true)
            .with_sample_rows(self.config.catalog_sample_rows)
            .with_max_text_len(self.config.catalog_max_text_len)
            .with_allow_list(self.config.allowed_tables.clone());

        build_catalog(
            self.inspector.as_ref(),
            self.config.schema.as_deref(),
            &options,
        )
        .await
    }

    /// [`Gateway::get_catalog`] as pretty JSON.
    ///
    /// # Errors
    /// Returns error if the catalog cannot be built or serialized.
    pub async fn get_catalog_json(&self) -> Result<String> {
        render::to_json(&self.get_catalog().await?)
    }

    /// [`Gateway::get_catalog`] as a Markdown summary.
    ///
    /// # Errors
    /// Returns error if the catalog cannot be built.
    pub async fn get_catalog_markdown(&self) -> Result<String> {
        Ok(render::to_markdown(&self.get_catalog().await?))
    }

    /// Validates and runs generated SQL.
    ///
    /// # Errors
    /// - [`GatewayError::Validation`] if the gatekeeper rejects the statement;
    ///   no connection is acquired in that case
    /// - [`GatewayError::PoolExhaustion`] or [`GatewayError::Execution`] from
    ///   the executor
    pub async fn run_query(&self, sql: &str) -> Result<QueryResult> {
        let query = self.gatekeeper.validate(sql)?;
        self.executor.execute(&query).await
    }

    /// Runs SQL generated for `question` and returns only the rows, as a
    /// JSON array of objects.
    ///
    /// The question is logged for traceability and otherwise unused.
    ///
    /// # Errors
    /// Same as [`Gateway::run_query`], plus serialization failures.
    pub async fn natural_language_to_rows(&self, question: &str, generated_sql: &str) -> Result<String> {
        tracing::debug!("Answering question: {}", question);
        let result = self.run_query(generated_sql).await?;
        serde_json::to_string(&result.rows).map_err(|e| GatewayError::Serialization {
            context: "Failed to serialize query rows".to_string(),
            source: e,
        })
    }
}
