//! Lexical safety gate for generated SQL.
//!
//! A statement passes through a fixed pipeline:
//!
//! 1. Strip a surrounding Markdown code fence and its language tag line
//! 2. Trim whitespace
//! 3. Require a leading `SELECT`
//! 4. Check every `FROM`/`JOIN` target against the allow-list, if any
//! 5. Append `LIMIT <default>` unless the statement already ends with one
//!
//! Comma-separated table lists after `FROM` are checked like joins. Trailing
//! comments are skipped when looking for an existing LIMIT, and an appended
//! LIMIT is placed before them so a `--` or `#` comment cannot swallow it.
//!
//! This is pattern matching, not parsing. Known gaps: table names inside
//! comments or string literals can cause over-rejection, function syntax
//! such as `EXTRACT(YEAR FROM col)` is read as a table reference, and CTE
//! names must themselves be allow-listed. A comment placed between `FROM`
//! and the table name hides that table from the allow-list check.
//! Multiple statements are not detected here; the executor sends statements
//! through the prepared protocol, which refuses more than one statement.

use crate::error::{GatewayError, QueryRejection};
use crate::models::ValidatedQuery;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Language tags accepted on the first line inside a code fence.
const FENCE_LANGUAGE_TAGS: &[&str] = &["sql", "mysql", "mariadb"];

/// A possibly schema-qualified, possibly quoted table name.
const TABLE_NAME: &str = r#"(?:[`"\[]?[\w$]+[`"\]]?\s*\.\s*)*[`"\[]?[\w$]+[`"\]]?"#;

struct GatePatterns {
    select: Regex,
    table_reference: Regex,
    comma_reference: Regex,
    trailing_limit: Regex,
}

impl GatePatterns {
    fn instance() -> &'static Self {
        static PATTERNS: OnceLock<GatePatterns> = OnceLock::new();
        PATTERNS.get_or_init(|| Self {
            select: Regex::new(r"(?i)^select\b").expect("Invalid select pattern"),
            table_reference: Regex::new(&format!(r"(?i)\b(?:from|join)\s+({})", TABLE_NAME))
                .expect("Invalid table reference pattern"),
            comma_reference: Regex::new(&format!(
                r#"(?i)^(?:\s+(?:as\s+)?[`"\[]?[\w$]+[`"\]]?)?\s*,\s*({})"#,
                TABLE_NAME
            ))
            .expect("Invalid comma reference pattern"),
            trailing_limit: Regex::new(
                r"(?i)\blimit\s+\d+(?:\s*(?:,|\boffset\b)\s*\d+)?\s*;?\s*$",
            )
            .expect("Invalid limit pattern"),
        })
    }
}

/// Removes a surrounding code fence.
///
/// If the text (ignoring leading whitespace) opens with a triple backtick and
/// a closing triple backtick exists, the interior is returned with a leading
/// `sql`/`mysql`/`mariadb` tag line dropped. Without a closing marker the
/// text is returned unchanged.
pub fn strip_code_fence(text: &str) -> &str {
    let Some(body) = text.trim_start().strip_prefix("```") else {
        return text;
    };
    let Some(end) = body.rfind("```") else {
        return text;
    };

    let interior = body[..end].trim();
    match interior.split_once('\n') {
        Some((first, rest))
            if FENCE_LANGUAGE_TAGS
                .iter()
                .any(|tag| first.trim().eq_ignore_ascii_case(tag)) =>
        {
            rest.trim()
        }
        None if FENCE_LANGUAGE_TAGS
            .iter()
            .any(|tag| interior.eq_ignore_ascii_case(tag)) =>
        {
            ""
        }
        _ => interior,
    }
}

/// Table names referenced after `FROM` or `JOIN`, unquoted and without schema.
///
/// Comma-separated lists such as `FROM a x, b` yield every listed table.
pub fn referenced_tables(sql: &str) -> Vec<String> {
    let patterns = GatePatterns::instance();
    let mut tables = Vec::new();

    for captures in patterns.table_reference.captures_iter(sql) {
        let Some(reference) = captures.get(1) else {
            continue;
        };
        tables.extend(base_name(reference.as_str()));

        let mut rest = &sql[reference.end()..];
        while let Some(next) = patterns
            .comma_reference
            .captures(rest)
            .and_then(|captures| captures.get(1))
        {
            tables.extend(base_name(next.as_str()));
            rest = &rest[next.end()..];
        }
    }

    tables
}

fn base_name(reference: &str) -> Option<String> {
    let base = reference.rsplit('.').next()?;
    let base = base.trim().trim_matches(|c| matches!(c, '`' | '"' | '[' | ']'));
    (!base.is_empty()).then(|| base.to_string())
}

/// Byte offset where trailing comments and whitespace begin.
///
/// Quoted strings and identifiers are skipped whole, so comment markers
/// inside them do not count.
fn code_end(sql: &str) -> usize {
    let mut chars = sql.char_indices().peekable();
    let mut end = 0;

    while let Some((index, c)) = chars.next() {
        let rest = &sql[index..];
        match c {
            '#' => skip_line(&mut chars),
            '-' if rest
                .strip_prefix("--")
                .is_some_and(|after| after.chars().next().is_none_or(char::is_whitespace)) =>
            {
                skip_line(&mut chars);
            }
            '/' if rest.starts_with("/*") => {
                chars.next();
                let mut previous = ' ';
                for (_, c) in chars.by_ref() {
                    if previous == '*' && c == '/' {
                        break;
                    }
                    previous = c;
                }
            }
            '\'' | '"' | '`' => {
                loop {
                    match chars.next() {
                        Some((_, '\\')) if c != '`' => {
                            chars.next();
                        }
                        Some((_, q)) if q == c => break,
                        Some(_) => {}
                        None => break,
                    }
                }
                end = chars.peek().map_or(sql.len(), |&(i, _)| i);
            }
            c if c.is_whitespace() => {}
            _ => end = chars.peek().map_or(sql.len(), |&(i, _)| i),
        }
    }

    end
}

fn skip_line(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>) {
    for (_, c) in chars.by_ref() {
        if c == '\n' {
            break;
        }
    }
}

/// True when the statement already ends with a LIMIT clause, ignoring
/// trailing comments.
pub fn has_trailing_limit(sql: &str) -> bool {
    GatePatterns::instance()
        .trailing_limit
        .is_match(&sql[..code_end(sql)])
}

/// Appends `LIMIT <limit>` unless a trailing LIMIT is already present.
///
/// The clause goes after the last code token, ahead of any trailing
/// comments, and a trailing semicolon is dropped.
pub fn ensure_limit(sql: &str, limit: u32) -> String {
    let (code, comments) = sql.split_at(code_end(sql));
    if GatePatterns::instance().trailing_limit.is_match(code) {
        return sql.to_string();
    }

    let body = code.trim_end_matches(|c: char| c == ';' || c.is_whitespace());
    let comments = comments.trim();
    if comments.is_empty() {
        format!("{} LIMIT {}", body, limit)
    } else {
        format!("{} LIMIT {} {}", body, limit, comments)
    }
}

fn leading_keyword(sql: &str) -> String {
    sql.split(|c: char| c.is_whitespace() || c == ';' || c == '(')
        .find(|word| !word.is_empty())
        .unwrap_or_default()
        .chars()
        .take(32)
        .collect::<String>()
        .to_uppercase()
}

/// Validates and rewrites generated SQL. Performs no I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gatekeeper {
    allowed_tables: Option<BTreeSet<String>>,
    default_limit: u32,
}

impl Gatekeeper {
    /// Creates a gatekeeper; `None` allows every table.
    pub fn new(allowed_tables: Option<BTreeSet<String>>, default_limit: u32) -> Self {
        let allowed_tables = allowed_tables
            .map(|set| set.into_iter().map(|t| t.to_lowercase()).collect::<BTreeSet<_>>())
            .filter(|set| !set.is_empty());
        Self {
            allowed_tables,
            default_limit,
        }
    }

    /// The row cap appended to statements without a LIMIT.
    pub fn default_limit(&self) -> u32 {
        self.default_limit
    }

    /// Whether a table name passes the allow-list.
    pub fn is_allowed(&self, table: &str) -> bool {
        self.allowed_tables
            .as_ref()
            .is_none_or(|allowed| allowed.contains(&table.to_lowercase()))
    }

    /// Runs the full pipeline, returning the sanitized statement.
    ///
    /// # Errors
    /// Returns the first rule the statement violates.
    pub fn sanitize(&self, text: &str) -> Result<String, QueryRejection> {
        let patterns = GatePatterns::instance();
        let sql = strip_code_fence(text).trim();

        if sql.is_empty() {
            return Err(QueryRejection::Empty);
        }

        if !patterns.select.is_match(sql) {
            return Err(QueryRejection::NotSelect {
                keyword: leading_keyword(sql),
            });
        }

        if self.allowed_tables.is_some()
            && let Some(table) = referenced_tables(sql)
                .into_iter()
                .find(|table| !self.is_allowed(table))
        {
            return Err(QueryRejection::DisallowedTable { table });
        }

        let limited = ensure_limit(sql, self.default_limit);
        if limited != sql {
            tracing::debug!("Appended LIMIT {} to generated statement", self.default_limit);
        }
        Ok(limited)
    }

    /// Reviews a statement, recording the outcome without failing.
    ///
    /// Rejected statements carry their trimmed, fence-stripped text.
    pub fn review(&self, text: &str) -> ValidatedQuery {
        match self.sanitize(text) {
            Ok(sanitized_text) => ValidatedQuery {
                original_text: text.to_string(),
                sanitized_text,
                allowed: true,
            },
            Err(rejection) => {
                tracing::warn!("Rejected generated statement: {}", rejection);
                ValidatedQuery {
                    original_text: text.to_string(),
                    sanitized_text: strip_code_fence(text).trim().to_string(),
                    allowed: false,
                }
            }
        }
    }

    /// Validates a statement for execution.
    ///
    /// # Errors
    /// Returns [`GatewayError::Validation`] naming the violated rule.
    pub fn validate(&self, text: &str) -> crate::Result<ValidatedQuery> {
        match self.sanitize(text) {
            Ok(sanitized_text) => Ok(ValidatedQuery {
                original_text: text.to_string(),
                sanitized_text,
                allowed: true,
            }),
            Err(rejection) => {
                tracing::warn!("Rejected generated statement: {}", rejection);
                Err(GatewayError::Validation(rejection))
            }
        }
    }
}
