//! JSON Schema validation for catalog output.
//!
//! Every catalog written by the CLI is checked against an embedded JSON
//! Schema and scanned for leaked connection strings before it leaves the
//! process.
//!
//! Credentials found in catalog text (comments, defaults, sample values,
//! error messages) are redacted in place by [`redact_catalog_credentials`];
//! the output check then only fails for leaks in identifiers.
//!
//! # Security Guarantees
//! - Connection strings with inline credentials are never emitted
//! - Structural drift in the catalog format is caught before consumers see it
//!
//! # Example
//! ```rust
//! use schemagate_core::models::Catalog;
//! use schemagate_core::validation::validate_catalog;
//!
//! let catalog = Catalog::new("hr");
//! validate_catalog(&catalog).expect("empty catalog is valid");
//! ```

use crate::models::{Catalog, SqlValue, TableEntry};
use jsonschema::Validator;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

/// Catalog output validation errors with field-level reporting
#[derive(Debug, Error)]
pub enum OutputValidationError {
    /// Schema compilation failed during initialization
    #[error("JSON Schema compilation failed: {message}")]
    SchemaCompilation { message: String },

    /// Validation failed with specific field errors
    #[error("Schema validation failed with {error_count} errors: {errors:?}")]
    ValidationFailed {
        error_count: usize,
        errors: Vec<String>,
    },

    /// Potential credential exposure
    #[error("Security validation failed: {reason}")]
    SecurityViolation { reason: String },

    /// JSON parsing error
    #[error("JSON parsing failed: {source}")]
    JsonParsing {
        #[from]
        source: serde_json::Error,
    },
}

/// Embedded JSON Schema for the catalog document
const CATALOG_SCHEMA: &str = r##"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "title": "schemagate catalog",
  "type": "object",
  "required": ["schema", "tables"],
  "additionalProperties": false,
  "properties": {
    "schema": { "type": "string", "minLength": 1 },
    "tables": {
      "type": "array",
      "items": {
        "oneOf": [
          { "$ref": "#/$defs/table" },
          { "$ref": "#/$defs/failed_table" }
        ]
      }
    }
  },
  "$defs": {
    "names": { "type": "array", "items": { "type": "string" } },
    "action": {
      "enum": ["CASCADE", "SET NULL", "SET DEFAULT", "RESTRICT", "NO ACTION", null]
    },
    "scalar": { "type": ["null", "boolean", "number", "string"] },
    "column": {
      "type": "object",
      "required": ["name", "type", "nullable", "default", "autoincrement", "comment"],
      "additionalProperties": false,
      "properties": {
        "name": { "type": "string", "minLength": 1 },
        "type": { "type": "string" },
        "nullable": { "type": "boolean" },
        "default": { "type": ["string", "null"] },
        "autoincrement": { "type": "boolean" },
        "comment": { "type": "string" }
      }
    },
    "foreign_key": {
      "type": "object",
      "required": ["name", "columns", "ref_schema", "ref_table", "ref_columns", "on_update", "on_delete"],
      "additionalProperties": false,
      "properties": {
        "name": { "type": ["string", "null"] },
        "columns": { "$ref": "#/$defs/names" },
        "ref_schema": { "type": ["string", "null"] },
        "ref_table": { "type": "string" },
        "ref_columns": { "$ref": "#/$defs/names" },
        "on_update": { "$ref": "#/$defs/action" },
        "on_delete": { "$ref": "#/$defs/action" }
      }
    },
    "index": {
      "type": "object",
      "required": ["name", "unique", "columns", "type"],
      "additionalProperties": false,
      "properties": {
        "name": { "type": "string" },
        "unique": { "type": "boolean" },
        "columns": { "$ref": "#/$defs/names" },
        "type": { "type": ["string", "null"] }
      }
    },
    "table": {
      "type": "object",
      "required": ["name", "comment", "columns", "primary_key", "foreign_keys", "indexes"],
      "additionalProperties": false,
      "properties": {
        "name": { "type": "string", "minLength": 1 },
        "comment": { "type": "string" },
        "columns": { "type": "array", "items": { "$ref": "#/$defs/column" } },
        "primary_key": { "$ref": "#/$defs/names" },
        "foreign_keys": { "type": "array", "items": { "$ref": "#/$defs/foreign_key" } },
        "indexes": { "type": "array", "items": { "$ref": "#/$defs/index" } },
        "sample_rows": {
          "type": "array",
          "items": { "type": "object", "additionalProperties": { "$ref": "#/$defs/scalar" } }
        }
      }
    },
    "failed_table": {
      "type": "object",
      "required": ["name", "error"],
      "additionalProperties": false,
      "properties": {
        "name": { "type": "string", "minLength": 1 },
        "error": { "type": "string" }
      }
    }
  }
}"##;

/// Compiled JSON Schema instance (initialized once)
static COMPILED_SCHEMA: OnceLock<Validator> = OnceLock::new();

/// Compiles the embedded JSON Schema and caches it for reuse.
///
/// Calling this more than once is harmless.
///
/// # Errors
/// Returns `OutputValidationError::SchemaCompilation` if the embedded schema is invalid.
pub fn initialize_catalog_validator() -> Result<&'static Validator, OutputValidationError> {
    if let Some(validator) = COMPILED_SCHEMA.get() {
        return Ok(validator);
    }

    let schema_json = get_schema_definition()?;
    let compiled = jsonschema::validator_for(&schema_json).map_err(|e| {
        OutputValidationError::SchemaCompilation {
            message: format!("Schema compilation error: {}", e),
        }
    })?;

    Ok(COMPILED_SCHEMA.get_or_init(|| compiled))
}

/// Validates a catalog's JSON form against the schema and leak checks.
///
/// # Errors
/// Returns every schema violation found, or the first security violation.
pub fn validate_catalog_output(json_value: &Value) -> Result<(), OutputValidationError> {
    let validator = initialize_catalog_validator()?;

    let errors: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !errors.is_empty() {
        return Err(OutputValidationError::ValidationFailed {
            error_count: errors.len(),
            errors,
        });
    }

    validate_no_connection_strings_recursive(json_value, "")
}

/// Validates a typed catalog.
///
/// # Errors
/// Returns error if serialization fails or the output is invalid.
pub fn validate_catalog(catalog: &Catalog) -> Result<(), OutputValidationError> {
    let json_value = serde_json::to_value(catalog)?;
    validate_catalog_output(&json_value)
}

/// Parses and validates a catalog document.
///
/// # Errors
/// Returns validation errors for malformed JSON, schema violations, or leaks.
pub fn validate_and_parse_catalog(json_str: &str) -> Result<Catalog, OutputValidationError> {
    let json_value: Value = serde_json::from_str(json_str)?;
    validate_catalog_output(&json_value)?;
    Ok(serde_json::from_value(json_value)?)
}

/// The embedded JSON Schema as a parsed value.
///
/// # Errors
/// Returns error if the embedded schema is not valid JSON.
pub fn get_schema_definition() -> Result<Value, OutputValidationError> {
    serde_json::from_str(CATALOG_SCHEMA).map_err(|e| OutputValidationError::SchemaCompilation {
        message: format!("Failed to parse embedded schema: {}", e),
    })
}

fn connection_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(?P<scheme>(?:mysql|mariadb)(?:\+[a-z0-9]+)?://)[^\s/@:]*:[^\s@]*@")
            .expect("Invalid connection string pattern")
    })
}

/// Checks whether a string holds a connection string with inline credentials.
pub fn contains_credentials(s: &str) -> bool {
    connection_pattern().is_match(s)
}

/// Replaces the user and password of embedded connection strings.
///
/// Returns whether the text changed.
pub fn redact_credentials(text: &mut String) -> bool {
    if !contains_credentials(text) {
        return false;
    }
    *text = connection_pattern()
        .replace_all(text, "${scheme}[REDACTED]@")
        .into_owned();
    true
}

/// Redacts connection strings with credentials from every free-text field
/// of a catalog, returning the number of values changed.
pub fn redact_catalog_credentials(catalog: &mut Catalog) -> usize {
    let mut redacted = 0;
    let mut redact = |text: &mut String| {
        if redact_credentials(text) {
            redacted += 1;
        }
    };

    for entry in &mut catalog.tables {
        match entry {
            TableEntry::Failed(failed) => redact(&mut failed.error),
            TableEntry::Inspected(table) => {
                redact(&mut table.comment);
                for column in &mut table.columns {
                    redact(&mut column.comment);
                    if let Some(default) = column.default.as_mut() {
                        redact(default);
                    }
                }
                for row in table.sample_rows.iter_mut().flatten() {
                    *row = std::mem::take(row).map_values(|value| match value {
                        SqlValue::Text(mut text) => {
                            redact(&mut text);
                            SqlValue::Text(text)
                        }
                        other => other,
                    });
                }
            }
        }
    }

    if redacted > 0 {
        tracing::warn!("Redacted {} connection strings from catalog text", redacted);
    }
    redacted
}

fn validate_no_connection_strings_recursive(
    value: &Value,
    path: &str,
) -> Result<(), OutputValidationError> {
    match value {
        Value::String(s) if contains_credentials(s) => {
            Err(OutputValidationError::SecurityViolation {
                reason: format!("Connection string with credentials found at path '{}'", path),
            })
        }
        Value::Object(obj) => {
            for (key, val) in obj {
                let new_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                validate_no_connection_strings_recursive(val, &new_path)?;
            }
            Ok(())
        }
        Value::Array(arr) => {
            for (index, item) in arr.iter().enumerate() {
                let new_path = format!("{}[{}]", path, index);
                validate_no_connection_strings_recursive(item, &new_path)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests;
