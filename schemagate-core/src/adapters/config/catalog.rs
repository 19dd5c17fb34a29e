//! Catalog build options.

use super::gateway::{DEFAULT_MAX_TEXT_LEN, allow_list};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Options for one catalog build.
///
/// # Example
/// ```rust
/// use schemagate_core::adapters::CatalogOptions;
///
/// let options = CatalogOptions::new()
///     .with_views(true)
///     .with_sample_rows(3)
///     .with_masking(true);
///
/// assert!(options.include_views);
/// assert_eq!(options.max_text_len, Some(160));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogOptions {
    /// Include views alongside physical tables
    pub include_views: bool,
    /// Sample rows per table; 0 disables sampling
    pub sample_rows: u32,
    /// Redact PII in sampled text
    pub mask_pii: bool,
    /// Truncation length for masked text; `None` disables truncation
    pub max_text_len: Option<usize>,
    /// Restrict the catalog to these tables
    pub allowed_tables: Option<BTreeSet<String>>,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            include_views: false,
            sample_rows: 0,
            mask_pii: false,
            max_text_len: Some(DEFAULT_MAX_TEXT_LEN),
            allowed_tables: None,
        }
    }
}

impl CatalogOptions {
    /// Creates options for a tables-only, unsampled catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to include views.
    pub fn with_views(mut self, include_views: bool) -> Self {
        self.include_views = include_views;
        self
    }

    /// Builder method to set the number of sample rows.
    pub fn with_sample_rows(mut self, rows: u32) -> Self {
        self.sample_rows = rows;
        self
    }

    /// Builder method to toggle PII masking.
    pub fn with_masking(mut self, mask_pii: bool) -> Self {
        self.mask_pii = mask_pii;
        self
    }

    /// Builder method to set the text truncation length; 0 disables truncation.
    pub fn with_max_text_len(mut self, max_text_len: usize) -> Self {
        self.max_text_len = (max_text_len > 0).then_some(max_text_len);
        self
    }

    /// Builder method to restrict the catalog to some tables.
    pub fn with_allowed_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_tables = allow_list(tables);
        self
    }

    /// Builder method to set an already-built allow-list.
    pub fn with_allow_list(mut self, allowed_tables: Option<BTreeSet<String>>) -> Self {
        self.allowed_tables = allowed_tables;
        self
    }
}
