//! Output operations for exported catalogs.
//!
//! Catalogs are redacted and validated before anything is written. JSON goes
//! to a file or to stdout; Markdown is written only when a path is given.

use schemagate_core::error::GatewayError;
use schemagate_core::models::Catalog;
use schemagate_core::validation::redact_catalog_credentials;
use schemagate_core::{Result, render, validate_catalog};
use std::path::Path;

/// Redacts, validates and writes a catalog's renderings.
///
/// Connection strings with credentials in free text are redacted rather than
/// failing the export. When `json_path` is `None` the JSON is printed to
/// stdout and a grounding hint for a query generator follows on stderr.
pub async fn write_catalog(
    catalog: &Catalog,
    json_path: Option<&Path>,
    markdown_path: Option<&Path>,
) -> Result<()> {
    let mut catalog = catalog.clone();
    redact_catalog_credentials(&mut catalog);
    let catalog = &catalog;

    validate_catalog(catalog)?;
    tracing::info!("Output validation passed");

    let json_data = render::to_json(catalog)?;
    match json_path {
        Some(path) => {
            save_text(path, &json_data).await?;
            tracing::info!("Catalog JSON saved to {}", path.display());
        }
        None => {
            println!("{}", json_data);
            eprintln!("{}", prompt_guidance(&catalog.schema));
        }
    }

    if let Some(path) = markdown_path {
        save_text(path, &render::to_markdown(catalog)).await?;
        tracing::info!("Catalog Markdown saved to {}", path.display());
    }

    Ok(())
}

/// Writes text to a file.
pub async fn save_text(path: &Path, data: &str) -> Result<()> {
    tokio::fs::write(path, data)
        .await
        .map_err(|e| GatewayError::Io {
            context: format!("Failed to write to {}", path.display()),
            source: e,
        })
}

/// Suggested context for a generator consuming a catalog printed to stdout.
pub fn prompt_guidance(schema: &str) -> String {
    format!(
        "
=== SUGGESTED CONTEXT FOR A SQL GENERATOR ===
You translate questions into SQL for MariaDB.
- Use only tables and columns from the catalog below.
- Prefer JOINs that follow the foreign keys.
- Add LIMIT 50 by default.
- Never issue statements that modify data (INSERT/UPDATE/DELETE/DDL).
Catalog (JSON):
<paste the JSON generated for schema {}>
",
        schema
    )
}
