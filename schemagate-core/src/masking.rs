//! Pattern-based PII redaction for sampled values.
//!
//! Textual values are scanned for email addresses, CPF numbers and phone
//! numbers (in that order), each replaced by a fixed placeholder. Whitespace
//! is then collapsed and the result truncated with an ellipsis. Masking is
//! lossy and irreversible; it never fails.

use crate::models::{Row, SqlValue};
use regex::Regex;
use std::sync::OnceLock;

/// Placeholder substituted for email addresses.
pub const EMAIL_PLACEHOLDER: &str = "[email]";
/// Placeholder substituted for CPF numbers.
pub const CPF_PLACEHOLDER: &str = "[cpf]";
/// Placeholder substituted for phone numbers.
pub const PHONE_PLACEHOLDER: &str = "[phone]";
/// Marker appended to truncated text.
pub const ELLIPSIS: &str = "…";

/// Pre-compiled redaction patterns.
struct MaskPatterns {
    email: Regex,
    cpf: Regex,
    phone: Regex,
    whitespace: Regex,
}

impl MaskPatterns {
    fn instance() -> &'static Self {
        static PATTERNS: OnceLock<MaskPatterns> = OnceLock::new();
        PATTERNS.get_or_init(Self::compile)
    }

    fn compile() -> Self {
        Self {
            email: Regex::new(r"(?i)[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}")
                .expect("Invalid email pattern"),
            cpf: Regex::new(r"\b\d{3}\.?\d{3}\.?\d{3}-?\d{2}\b").expect("Invalid CPF pattern"),
            phone: Regex::new(r"\b(?:\+?55\s?)?(?:\(?\d{2}\)?\s?)?(?:9?\d{4}[-\s]?\d{4})\b")
                .expect("Invalid phone pattern"),
            whitespace: Regex::new(r"\s+").expect("Invalid whitespace pattern"),
        }
    }
}

/// Redacts, collapses and truncates a single text value.
///
/// `max_len` counts characters; `None` disables truncation.
///
/// # Example
/// ```rust
/// use schemagate_core::masking::mask_text;
///
/// let masked = mask_text("mail  jane@example.com", None);
/// assert_eq!(masked, "mail [email]");
/// ```
pub fn mask_text(text: &str, max_len: Option<usize>) -> String {
    let patterns = MaskPatterns::instance();

    let masked = patterns.email.replace_all(text, EMAIL_PLACEHOLDER);
    let masked = patterns.cpf.replace_all(&masked, CPF_PLACEHOLDER);
    let masked = patterns.phone.replace_all(&masked, PHONE_PLACEHOLDER);
    let collapsed = patterns.whitespace.replace_all(&masked, " ");

    truncate(collapsed.trim(), max_len)
}

/// Masks a scalar. Only text is touched; other values pass through unchanged.
pub fn mask_value(value: SqlValue, max_len: Option<usize>) -> SqlValue {
    match value {
        SqlValue::Text(text) => SqlValue::Text(mask_text(&text, max_len)),
        other => other,
    }
}

/// Masks every value of a sample row.
pub fn mask_row(row: Row, max_len: Option<usize>) -> Row {
    row.map_values(|value| mask_value(value, max_len))
}

fn truncate(text: &str, max_len: Option<usize>) -> String {
    match max_len {
        Some(max) if text.chars().count() > max => {
            let mut cut: String = text.chars().take(max).collect();
            cut.push_str(ELLIPSIS);
            cut
        }
        _ => text.to_string(),
    }
}
