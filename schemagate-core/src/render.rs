//! Catalog serialization.
//!
//! Two renderings of the same document: pretty JSON for programs and a
//! compact Markdown summary for embedding in a generator prompt.

use crate::Result;
use crate::error::GatewayError;
use crate::models::{Catalog, Column, ForeignKey, Index, Row, SqlValue, Table, TableEntry};
use std::fmt::Write as _;

/// Serializes a catalog as pretty-printed JSON.
///
/// # Errors
/// Returns error if serialization fails.
pub fn to_json(catalog: &Catalog) -> Result<String> {
    serde_json::to_string_pretty(catalog).map_err(|e| GatewayError::Serialization {
        context: format!("Failed to serialize catalog for schema '{}'", catalog.schema),
        source: e,
    })
}

/// Renders a catalog as Markdown, one section per table.
pub fn to_markdown(catalog: &Catalog) -> String {
    let mut lines = vec![format!("# Catalog: schema `{}`", catalog.schema), String::new()];

    for entry in &catalog.tables {
        match entry {
            TableEntry::Inspected(table) => render_table(table, &mut lines),
            TableEntry::Failed(failed) => {
                lines.push(format!("## {}", failed.name));
                lines.push(format!("**Error:** {}", failed.error));
            }
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

fn render_table(table: &Table, lines: &mut Vec<String>) {
    lines.push(format!("## {}", table.name));
    if !table.comment.is_empty() {
        lines.push(format!("> {}", table.comment));
    }

    if !table.columns.is_empty() {
        lines.push("**Columns:**".to_string());
        lines.extend(table.columns.iter().map(render_column));
    }

    if !table.primary_key.is_empty() {
        lines.push(format!("**PK:** {}", quoted_list(&table.primary_key)));
    }

    if !table.foreign_keys.is_empty() {
        lines.push("**FKs:**".to_string());
        lines.extend(table.foreign_keys.iter().map(render_foreign_key));
    }

    if !table.indexes.is_empty() {
        lines.push("**Indexes:**".to_string());
        lines.extend(table.indexes.iter().map(render_index));
    }

    if let Some(rows) = table.sample_rows.as_ref().filter(|rows| !rows.is_empty()) {
        lines.push("**Sample:**".to_string());
        lines.extend(rows.iter().map(render_row));
    }
}

fn quoted_list(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("`{}`", n))
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_column(column: &Column) -> String {
    let mut bits = vec![format!("`{}` {}", column.name, column.data_type)];
    if !column.nullable {
        bits.push("NOT NULL".to_string());
    }
    if let Some(default) = &column.default {
        bits.push(format!("DEFAULT {}", default));
    }
    if !column.comment.is_empty() {
        bits.push(format!("// {}", column.comment));
    }
    format!(" - {}", bits.join(" | "))
}

fn render_foreign_key(fk: &ForeignKey) -> String {
    let mut line = format!(
        " - {} → `{}`({})",
        quoted_list(&fk.columns),
        fk.ref_table,
        quoted_list(&fk.ref_columns)
    );
    if let Some(action) = fk.on_update {
        let _ = write!(line, " ON UPDATE {}", action);
    }
    if let Some(action) = fk.on_delete {
        let _ = write!(line, " ON DELETE {}", action);
    }
    line
}

fn render_index(index: &Index) -> String {
    let unique = if index.unique { " UNIQUE" } else { "" };
    let kind = index
        .kind
        .as_deref()
        .map_or_else(String::new, |k| format!(" {}", k));
    format!(
        " - `{}`{}{} ({})",
        index.name,
        unique,
        kind,
        quoted_list(&index.columns)
    )
}

fn render_row(row: &Row) -> String {
    let cells: Vec<String> = row
        .iter()
        .map(|(column, value)| format!("`{}`={}", column, literal(value)))
        .collect();
    format!(" - {}", cells.join(", "))
}

fn literal(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Bool(b) => b.to_string(),
        SqlValue::Integer(i) => i.to_string(),
        SqlValue::Float(f) => f.to_string(),
        SqlValue::Text(s) => format!("'{}'", s.replace('\'', "\\'")),
    }
}
