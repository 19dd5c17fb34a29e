//! Catalog and query data models.
//!
//! These types are the wire format of the gateway: the catalog document handed
//! to a query generator, the rows returned from gated queries, and the
//! transient result of gatekeeper review. Every value that originates in the
//! database is carried as a [`SqlValue`], never as a driver-native type, so
//! serialization is total and deterministic.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// JSON-safe scalar produced by the type normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    /// SQL NULL
    Null,
    /// Boolean (`BOOLEAN` / `TINYINT(1)`)
    Bool(bool),
    /// Signed integer
    Integer(i64),
    /// Finite floating point number (also used for decimals)
    Float(f64),
    /// Text, including ISO-8601 temporal values and decoded binary data
    Text(String),
}

impl SqlValue {
    /// Returns true for SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the text payload, if this is a textual value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// A result or sample row: column name to value, in select-list order.
///
/// Serialized as a JSON object whose keys keep the order the database
/// reported the columns in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    entries: Vec<(String, SqlValue)>,
}

impl Row {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column value.
    ///
    /// A repeated column name, as in `SELECT a.id, b.id`, is stored under the
    /// first free numbered label (`id_2`, `id_3`, ...) so no value is lost.
    pub fn push(&mut self, column: impl Into<String>, value: SqlValue) {
        let column = column.into();
        let label = if self.get(&column).is_some() {
            self.free_label(&column)
        } else {
            column
        };
        self.entries.push((label, value));
    }

    fn free_label(&self, column: &str) -> String {
        (2usize..)
            .map(|n| format!("{}_{}", column, n))
            .find(|label| self.get(label).is_none())
            .unwrap_or_else(|| column.to_string())
    }

    /// Looks up a value by column name.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Number of columns in the row.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(column, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Applies `f` to every value, keeping column order.
    pub fn map_values(self, mut f: impl FnMut(SqlValue) -> SqlValue) -> Self {
        Self {
            entries: self
                .entries
                .into_iter()
                .map(|(name, value)| (name, f(value)))
                .collect(),
        }
    }
}

impl FromIterator<(String, SqlValue)> for Row {
    fn from_iter<T: IntoIterator<Item = (String, SqlValue)>>(iter: T) -> Self {
        let mut row = Row::new();
        for (column, value) in iter {
            row.push(column, value);
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = Row;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map of column names to scalar values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Row, A::Error> {
                let mut row = Row::new();
                while let Some((name, value)) = access.next_entry::<String, SqlValue>()? {
                    row.push(name, value);
                }
                Ok(row)
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}

/// Referential action for ON UPDATE / ON DELETE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferentialAction {
    #[serde(rename = "CASCADE")]
    Cascade,
    #[serde(rename = "SET NULL")]
    SetNull,
    #[serde(rename = "SET DEFAULT")]
    SetDefault,
    #[serde(rename = "RESTRICT")]
    Restrict,
    #[serde(rename = "NO ACTION")]
    NoAction,
}

impl ReferentialAction {
    /// Parses a rule as reported by MySQL/MariaDB; unknown or empty text yields `None`.
    ///
    /// Unknown non-empty text is logged at debug level.
    pub fn parse(rule: &str) -> Option<Self> {
        let normalized = rule.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.to_uppercase().as_str() {
            "CASCADE" => Some(Self::Cascade),
            "SET NULL" => Some(Self::SetNull),
            "SET DEFAULT" => Some(Self::SetDefault),
            "RESTRICT" => Some(Self::Restrict),
            "NO ACTION" => Some(Self::NoAction),
            "" => None,
            _ => {
                tracing::debug!("Ignoring unrecognized referential action '{}'", normalized);
                None
            }
        }
    }
}

impl std::fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
            Self::Restrict => "RESTRICT",
            Self::NoAction => "NO ACTION",
        };
        f.write_str(text)
    }
}

/// Column metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Normalized lowercase type, e.g. `varchar(255)` or `int(10) unsigned`
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub autoincrement: bool,
    pub comment: String,
}

/// Foreign key constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub ref_schema: Option<String>,
    pub ref_table: String,
    pub ref_columns: Vec<String>,
    pub on_update: Option<ReferentialAction>,
    pub on_delete: Option<ReferentialAction>,
}

/// Secondary index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub unique: bool,
    pub columns: Vec<String>,
    /// Index kind for FULLTEXT/SPATIAL indexes, `None` for ordinary ones
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// A fully inspected table or view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub comment: String,
    pub columns: Vec<Column>,
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKey>,
    pub indexes: Vec<Index>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rows: Option<Vec<Row>>,
}

impl Table {
    /// Creates a table with no columns, keys or indexes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: String::new(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
            sample_rows: None,
        }
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// A table whose inspection failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedTable {
    pub name: String,
    pub error: String,
}

/// One entry of the catalog: either an inspected table or a recorded failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TableEntry {
    Inspected(Table),
    Failed(FailedTable),
}

impl TableEntry {
    /// Table name regardless of outcome.
    pub fn name(&self) -> &str {
        match self {
            Self::Inspected(table) => &table.name,
            Self::Failed(failed) => &failed.name,
        }
    }

    /// The inspected table, if inspection succeeded.
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Self::Inspected(table) => Some(table),
            Self::Failed(_) => None,
        }
    }

    /// The recorded error, if inspection failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Inspected(_) => None,
            Self::Failed(failed) => Some(&failed.error),
        }
    }
}

/// Complete catalog document for one schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub schema: String,
    pub tables: Vec<TableEntry>,
}

impl Catalog {
    /// Creates an empty catalog for a schema.
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            tables: Vec::new(),
        }
    }

    /// Looks up an entry by table name.
    pub fn entry(&self, name: &str) -> Option<&TableEntry> {
        self.tables.iter().find(|t| t.name() == name)
    }

    /// Looks up an inspected table by name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.entry(name).and_then(TableEntry::as_table)
    }

    /// Successfully inspected tables, in catalog order.
    pub fn inspected(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter().filter_map(TableEntry::as_table)
    }

    /// Number of entries whose inspection failed.
    pub fn failed_count(&self) -> usize {
        self.tables.iter().filter(|t| t.error().is_some()).count()
    }

    /// Total number of columns across inspected tables.
    pub fn column_count(&self) -> usize {
        self.inspected().map(|t| t.columns.len()).sum()
    }

    /// Total number of foreign keys across inspected tables.
    pub fn foreign_key_count(&self) -> usize {
        self.inspected().map(|t| t.foreign_keys.len()).sum()
    }
}

/// Outcome of gatekeeper review for one generated statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuery {
    /// Text exactly as received from the generator
    pub original_text: String,
    /// Fence-stripped, trimmed and (when allowed) limit-capped text
    pub sanitized_text: String,
    /// Whether the statement passed every rule
    pub allowed: bool,
}

/// Rows returned by a gated query, together with the SQL that actually ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub sql: String,
    pub rows: Vec<Row>,
    pub row_count: usize,
}

impl QueryResult {
    /// Wraps rows with the SQL that produced them.
    pub fn new(sql: impl Into<String>, rows: Vec<Row>) -> Self {
        let row_count = rows.len();
        Self {
            sql: sql.into(),
            rows,
            row_count,
        }
    }
}
