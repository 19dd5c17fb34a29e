//! Core library for schemagate.
//!
//! schemagate exports a read-only catalog of a MariaDB/MySQL schema for use as
//! grounding context by a query generator, and gates the SQL that generator
//! produces before running it.
//!
//! # Security Guarantees
//! - All database operations are read-only; pooled sessions are read-only
//!   transactions pinned to UTC
//! - Generated SQL must be a single SELECT over allow-listed tables and is
//!   always row-capped
//! - Sampled text can be PII-masked irreversibly
//! - Connection strings are redacted in every error and log line
//!
//! # Architecture
//! - [`adapters::SchemaInspector`] is the only seam to the database metadata
//! - [`catalog`] builds the document, [`render`] serializes it
//! - [`gatekeeper`] vets SQL lexically, [`executor`] runs it
//! - [`gateway::Gateway`] is the tool surface combining the two halves

pub mod adapters;
pub mod catalog;
pub mod error;
pub mod executor;
pub mod gatekeeper;
pub mod gateway;
pub mod logging;
pub mod masking;
pub mod models;
pub mod normalize;
pub mod referential;
pub mod render;
pub mod validation;

// Re-export commonly used types
pub use adapters::{CatalogOptions, GatewayConfig, MySqlInspector, PoolConfig, SchemaInspector};
pub use catalog::build_catalog;
pub use error::{GatewayError, QueryRejection, Result};
pub use executor::QueryExecutor;
pub use gatekeeper::Gatekeeper;
pub use gateway::Gateway;
pub use models::{
    Catalog, Column, FailedTable, ForeignKey, Index, QueryResult, ReferentialAction, Row,
    SqlValue, Table, TableEntry, ValidatedQuery,
};
pub use validation::{
    OutputValidationError, initialize_catalog_validator, redact_catalog_credentials,
    validate_and_parse_catalog, validate_catalog, validate_catalog_output,
};
