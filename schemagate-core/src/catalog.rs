//! Catalog construction.
//!
//! [`build_catalog`] resolves the effective schema, enumerates tables (and
//! optionally views), and inspects each one independently. A failure while
//! inspecting one table is recorded as a [`TableEntry::Failed`] and the
//! build moves on; only an unresolvable schema aborts the whole build.
//! Connection strings with credentials found in comments, defaults or
//! sample values are redacted before the catalog is returned.

use crate::Result;
use crate::adapters::{CatalogOptions, SchemaInspector};
use crate::error::GatewayError;
use crate::masking::mask_row;
use crate::models::{Catalog, FailedTable, Table, TableEntry};
use crate::referential::{self, RuleMap, apply_rules};
use crate::validation::redact_catalog_credentials;
use std::collections::HashSet;

/// Determines the schema a catalog is built for.
///
/// An explicit, non-blank name wins; otherwise the connection's current
/// database is used.
///
/// # Errors
/// Returns [`GatewayError::SchemaResolution`] if neither is available.
pub async fn resolve_schema(inspector: &dyn SchemaInspector, explicit: Option<&str>) -> Result<String> {
    if let Some(schema) = explicit.map(str::trim).filter(|s| !s.is_empty()) {
        return Ok(schema.to_string());
    }

    match inspector.current_schema().await {
        Ok(Some(schema)) => Ok(schema),
        Ok(None) => Err(GatewayError::schema_unresolved(
            "no schema given and the connection has no current database",
        )),
        Err(e) => Err(GatewayError::schema_unresolved(format!(
            "could not query the current database: {}",
            e
        ))),
    }
}

/// Builds the catalog document for a schema.
///
/// # Errors
/// Returns error if the schema cannot be resolved or its tables cannot be
/// enumerated. Per-table failures are recorded in the catalog instead.
pub async fn build_catalog(
    inspector: &dyn SchemaInspector,
    schema: Option<&str>,
    options: &CatalogOptions,
) -> Result<Catalog> {
    let start_time = std::time::Instant::now();
    let schema = resolve_schema(inspector, schema).await?;

    tracing::info!("Building catalog for schema '{}'", schema);

    let candidates = enumerate_tables(inspector, &schema, options).await?;
    let rules = referential::resolve(inspector, &schema).await;

    let mut catalog = Catalog::new(schema.clone());
    for name in candidates {
        tracing::debug!("Inspecting table '{}.{}'", schema, name);
        let entry = match inspect_table(inspector, &schema, &name, &rules, options).await {
            Ok(table) => TableEntry::Inspected(table),
            Err(e) => {
                tracing::warn!("Failed to inspect table '{}.{}': {}", schema, name, e);
                TableEntry::Failed(FailedTable {
                    name,
                    error: e.to_string(),
                })
            }
        };
        catalog.tables.push(entry);
    }

    redact_catalog_credentials(&mut catalog);

    tracing::info!(
        "Catalog for '{}' built in {:.2}s - {} tables, {} failed",
        schema,
        start_time.elapsed().as_secs_f64(),
        catalog.tables.len(),
        catalog.failed_count()
    );

    Ok(catalog)
}

/// Tables (then views) in enumeration order, restricted to the allow-list.
///
/// Allow-list entries match table names case-insensitively, as the
/// gatekeeper does.
async fn enumerate_tables(
    inspector: &dyn SchemaInspector,
    schema: &str,
    options: &CatalogOptions,
) -> Result<Vec<String>> {
    let mut names = inspector.table_names(schema).await?;

    if options.include_views {
        match inspector.view_names(schema).await {
            Ok(views) => names.extend(views),
            Err(e) => tracing::warn!("Failed to enumerate views of '{}': {}", schema, e),
        }
    }

    let mut seen = HashSet::new();
    names.retain(|name| seen.insert(name.clone()));

    if let Some(allowed) = &options.allowed_tables {
        let allowed: HashSet<String> = allowed.iter().map(|t| t.to_lowercase()).collect();
        names.retain(|name| allowed.contains(&name.to_lowercase()));
    }

    Ok(names)
}

async fn inspect_table(
    inspector: &dyn SchemaInspector,
    schema: &str,
    name: &str,
    rules: &RuleMap,
    options: &CatalogOptions,
) -> Result<Table> {
    let mut table = Table::new(name);
    table.comment = inspector.table_comment(schema, name).await?;
    table.columns = inspector.columns(schema, name).await?;
    table.primary_key = inspector.primary_key(schema, name).await?;
    table.foreign_keys = inspector.foreign_keys(schema, name).await?;
    apply_rules(&mut table.foreign_keys, rules);
    table.indexes = inspector.indexes(schema, name).await?;

    if options.sample_rows > 0 {
        table.sample_rows = Some(sample_table(inspector, schema, &table, options).await);
    }

    Ok(table)
}

/// Sampling is best effort: a failed sample leaves an empty row list.
async fn sample_table(
    inspector: &dyn SchemaInspector,
    schema: &str,
    table: &Table,
    options: &CatalogOptions,
) -> Vec<crate::models::Row> {
    let columns = table.column_names();
    match inspector
        .sample_rows(schema, &table.name, &columns, options.sample_rows)
        .await
    {
        Ok(rows) if options.mask_pii => rows
            .into_iter()
            .map(|row| mask_row(row, options.max_text_len))
            .collect(),
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!("Failed to sample table '{}.{}': {}", schema, table.name, e);
            Vec::new()
        }
    }
}
