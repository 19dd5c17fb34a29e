//! Gateway policy configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Row cap appended to statements that carry no LIMIT.
pub const DEFAULT_LIMIT: u32 = 200;
/// Default maximum length of sampled text values.
pub const DEFAULT_MAX_TEXT_LEN: usize = 160;

/// Policy applied by the tool surface.
///
/// `allowed_tables` of `None` means every table may be queried; a present
/// set restricts both table listing and generated SQL to its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Optional schema override; otherwise the connection's current database
    pub schema: Option<String>,
    /// Tables generated SQL may reference
    pub allowed_tables: Option<BTreeSet<String>>,
    /// LIMIT injected when a statement has none
    pub default_limit: u32,
    /// Text truncation length for catalog sample values
    pub catalog_max_text_len: usize,
    /// Sample rows included in catalogs served to the generator
    pub catalog_sample_rows: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            schema: None,
            allowed_tables: None,
            default_limit: DEFAULT_LIMIT,
            catalog_max_text_len: DEFAULT_MAX_TEXT_LEN,
            catalog_sample_rows: 0,
        }
    }
}

impl GatewayConfig {
    /// Creates a config with no allow-list and default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates policy values.
    ///
    /// # Errors
    /// Returns error if the default limit is zero.
    pub fn validate(&self) -> crate::Result<()> {
        if self.default_limit == 0 {
            return Err(crate::error::GatewayError::configuration(
                "default_limit must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Builder method to set the schema override.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Builder method to set the allow-list; an empty list clears it.
    pub fn with_allowed_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_tables = allow_list(tables);
        self
    }

    /// Builder method to set the default row cap.
    pub fn with_default_limit(mut self, limit: u32) -> Self {
        self.default_limit = limit;
        self
    }

    /// Builder method to set catalog sampling.
    pub fn with_catalog_sample_rows(mut self, rows: u32) -> Self {
        self.catalog_sample_rows = rows;
        self
    }
}

/// Builds an allow-list from table names.
///
/// Names are trimmed and blanks dropped; if nothing remains the result is
/// `None`, meaning unrestricted.
pub fn allow_list<I, S>(tables: I) -> Option<BTreeSet<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let set: BTreeSet<String> = tables
        .into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    if set.is_empty() { None } else { Some(set) }
}

/// Parses a comma-separated allow-list such as `"candidates, interviews"`.
pub fn parse_allow_list(raw: &str) -> Option<BTreeSet<String>> {
    allow_list(raw.split(','))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_config_default() {
        let config = GatewayConfig::default();
        assert_eq!(config.allowed_tables, None);
        assert_eq!(config.default_limit, 200);
        assert_eq!(config.catalog_max_text_len, 160);
        assert_eq!(config.catalog_sample_rows, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_allow_list() {
        let set = parse_allow_list(" candidates, interviews ,,").expect("non-empty");
        assert_eq!(
            set.into_iter().collect::<Vec<_>>(),
            vec!["candidates".to_string(), "interviews".to_string()]
        );
        assert_eq!(parse_allow_list(""), None);
        assert_eq!(parse_allow_list(" , "), None);
    }

    #[test]
    fn test_empty_allow_list_means_unrestricted() {
        let config = GatewayConfig::new().with_allowed_tables(Vec::<String>::new());
        assert_eq!(config.allowed_tables, None);
    }

    #[test]
    fn test_zero_limit_rejected() {
        assert!(GatewayConfig::new().with_default_limit(0).validate().is_err());
    }
}
