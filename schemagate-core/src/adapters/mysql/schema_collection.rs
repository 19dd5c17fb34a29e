//! MySQL/MariaDB metadata queries.
//!
//! Every query reads `INFORMATION_SCHEMA` (or `SHOW CREATE TABLE`) with bound
//! parameters. Text columns are cast to CHAR so MySQL 8's VARBINARY-typed
//! metadata decodes as strings.

use super::ddl::declared_actions;
use super::sampling::quote_identifier;
use crate::Result;
use crate::error::GatewayError;
use crate::models::{Column, ForeignKey, Index};
use crate::normalize;
use crate::referential::{ReferentialRule, RuleMap, apply_rules};
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlPool, Row};

/// Typed field extraction with per-table error context.
trait RowExt {
    fn get_field<'r, T>(&'r self, field_name: &str, table: &str) -> Result<T>
    where
        T: sqlx::Decode<'r, MySql> + sqlx::Type<MySql>;
}

impl RowExt for MySqlRow {
    fn get_field<'r, T>(&'r self, field_name: &str, table: &str) -> Result<T>
    where
        T: sqlx::Decode<'r, MySql> + sqlx::Type<MySql>,
    {
        self.try_get(field_name).map_err(|e| {
            GatewayError::inspection_failed(table, format!("Failed to read field '{}'", field_name), e)
        })
    }
}

/// Groups rows by key while keeping first-appearance order.
fn group_ordered<K: PartialEq, V>(items: impl IntoIterator<Item = (K, V)>) -> Vec<(K, Vec<V>)> {
    let mut groups: Vec<(K, Vec<V>)> = Vec::new();
    for (key, value) in items {
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => groups.push((key, vec![value])),
        }
    }
    groups
}

/// Name of the database the connection is using.
pub(crate) async fn current_schema(pool: &MySqlPool) -> Result<Option<String>> {
    let schema: Option<String> = sqlx::query_scalar("SELECT DATABASE()")
        .fetch_one(pool)
        .await
        .map_err(|e| GatewayError::collection_failed("Failed to query current database", e))?;
    Ok(schema.filter(|s| !s.is_empty()))
}

async fn names_by_type(pool: &MySqlPool, schema: &str, table_types: &str) -> Result<Vec<String>> {
    let query = format!(
        r#"
        SELECT CAST(TABLE_NAME AS CHAR) AS TABLE_NAME
        FROM INFORMATION_SCHEMA.TABLES
        WHERE TABLE_SCHEMA = ?
        AND TABLE_TYPE IN ({})
        ORDER BY TABLE_NAME
    "#,
        table_types
    );

    let names: Vec<String> = sqlx::query_scalar(&query)
        .bind(schema)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            GatewayError::collection_failed(
                format!("Failed to enumerate tables of schema '{}'", schema),
                e,
            )
        })?;
    Ok(names)
}

/// Physical tables, including system-versioned tables on MariaDB.
pub(crate) async fn table_names(pool: &MySqlPool, schema: &str) -> Result<Vec<String>> {
    names_by_type(pool, schema, "'BASE TABLE', 'SYSTEM VERSIONED'").await
}

pub(crate) async fn view_names(pool: &MySqlPool, schema: &str) -> Result<Vec<String>> {
    names_by_type(pool, schema, "'VIEW'").await
}

/// Table comment; MySQL reports the literal `VIEW` for views, which is dropped.
pub(crate) async fn table_comment(pool: &MySqlPool, schema: &str, table: &str) -> Result<String> {
    let comment: Option<Option<String>> = sqlx::query_scalar(
        r#"
        SELECT CAST(TABLE_COMMENT AS CHAR) AS TABLE_COMMENT
        FROM INFORMATION_SCHEMA.TABLES
        WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
    "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_optional(pool)
    .await
    .map_err(|e| GatewayError::inspection_failed(table, "Failed to read table comment", e))?;

    Ok(comment
        .flatten()
        .filter(|c| c != "VIEW")
        .unwrap_or_default())
}

/// Columns in declaration order.
pub(crate) async fn columns(pool: &MySqlPool, schema: &str, table: &str) -> Result<Vec<Column>> {
    let rows = sqlx::query(
        r#"
        SELECT
            CAST(COLUMN_NAME AS CHAR) AS COLUMN_NAME,
            CAST(COLUMN_TYPE AS CHAR) AS COLUMN_TYPE,
            CAST(IS_NULLABLE AS CHAR) AS IS_NULLABLE,
            CAST(COLUMN_DEFAULT AS CHAR) AS COLUMN_DEFAULT,
            CAST(EXTRA AS CHAR) AS EXTRA,
            CAST(COLUMN_COMMENT AS CHAR) AS COLUMN_COMMENT
        FROM INFORMATION_SCHEMA.COLUMNS
        WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
        ORDER BY ORDINAL_POSITION
    "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(|e| GatewayError::inspection_failed(table, "Failed to read columns", e))?;

    if rows.is_empty() {
        return Err(GatewayError::table_unreadable(
            table,
            format!("No columns visible for '{}.{}'", schema, table),
        ));
    }

    let mut columns = Vec::with_capacity(rows.len());
    for row in &rows {
        let name: String = row.get_field("COLUMN_NAME", table)?;
        let column_type: String = row.get_field("COLUMN_TYPE", table)?;
        let is_nullable: String = row.get_field("IS_NULLABLE", table)?;
        let default: Option<String> = row.get_field("COLUMN_DEFAULT", table)?;
        let extra: Option<String> = row.get_field("EXTRA", table)?;
        let comment: Option<String> = row.get_field("COLUMN_COMMENT", table)?;

        columns.push(Column {
            name,
            data_type: normalize::normalize_type(&column_type),
            nullable: is_nullable.eq_ignore_ascii_case("YES"),
            default: normalize::normalize_default(default),
            autoincrement: normalize::autoincrement_flag(extra.as_deref()),
            comment: comment.unwrap_or_default(),
        });
    }

    Ok(columns)
}

pub(crate) async fn primary_key(pool: &MySqlPool, schema: &str, table: &str) -> Result<Vec<String>> {
    let columns: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT CAST(COLUMN_NAME AS CHAR) AS COLUMN_NAME
        FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE
        WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
        AND CONSTRAINT_NAME = 'PRIMARY'
        ORDER BY ORDINAL_POSITION
    "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(|e| GatewayError::inspection_failed(table, "Failed to read primary key", e))?;

    Ok(columns)
}

struct ForeignKeyPart {
    column: String,
    ref_schema: Option<String>,
    ref_table: String,
    ref_column: String,
}

/// Foreign keys with their explicitly declared actions.
pub(crate) async fn foreign_keys(
    pool: &MySqlPool,
    schema: &str,
    table: &str,
) -> Result<Vec<ForeignKey>> {
    let rows = sqlx::query(
        r#"
        SELECT
            CAST(CONSTRAINT_NAME AS CHAR) AS CONSTRAINT_NAME,
            CAST(COLUMN_NAME AS CHAR) AS COLUMN_NAME,
            CAST(REFERENCED_TABLE_SCHEMA AS CHAR) AS REFERENCED_TABLE_SCHEMA,
            CAST(REFERENCED_TABLE_NAME AS CHAR) AS REFERENCED_TABLE_NAME,
            CAST(REFERENCED_COLUMN_NAME AS CHAR) AS REFERENCED_COLUMN_NAME
        FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE
        WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
        AND REFERENCED_TABLE_NAME IS NOT NULL
        ORDER BY CONSTRAINT_NAME, ORDINAL_POSITION
    "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(|e| GatewayError::inspection_failed(table, "Failed to read foreign keys", e))?;

    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let mut parts = Vec::with_capacity(rows.len());
    for row in &rows {
        let name: String = row.get_field("CONSTRAINT_NAME", table)?;
        parts.push((
            name,
            ForeignKeyPart {
                column: row.get_field("COLUMN_NAME", table)?,
                ref_schema: row.get_field("REFERENCED_TABLE_SCHEMA", table)?,
                ref_table: row.get_field("REFERENCED_TABLE_NAME", table)?,
                ref_column: row.get_field("REFERENCED_COLUMN_NAME", table)?,
            },
        ));
    }

    let mut foreign_keys: Vec<ForeignKey> = group_ordered(parts)
        .into_iter()
        .filter_map(|(name, parts)| {
            let first = parts.first()?;
            Some(ForeignKey {
                ref_schema: first.ref_schema.clone(),
                ref_table: first.ref_table.clone(),
                columns: parts.iter().map(|p| p.column.clone()).collect(),
                ref_columns: parts.iter().map(|p| p.ref_column.clone()).collect(),
                name: Some(name),
                on_update: None,
                on_delete: None,
            })
        })
        .collect();

    match show_create_table(pool, schema, table).await {
        Ok(ddl) => apply_rules(&mut foreign_keys, &declared_actions(&ddl)),
        Err(e) => tracing::warn!("Declared foreign key actions unavailable for '{}': {}", table, e),
    }

    Ok(foreign_keys)
}

async fn show_create_table(pool: &MySqlPool, schema: &str, table: &str) -> Result<String> {
    let query = format!(
        "SHOW CREATE TABLE {}.{}",
        quote_identifier(schema),
        quote_identifier(table)
    );
    let row = sqlx::query(&query)
        .fetch_one(pool)
        .await
        .map_err(|e| GatewayError::inspection_failed(table, "Failed to read table definition", e))?;

    row.try_get_unchecked::<String, _>(1)
        .map_err(|e| GatewayError::inspection_failed(table, "Failed to decode table definition", e))
}

struct IndexPart {
    column: Option<String>,
    non_unique: i64,
    index_type: Option<String>,
}

/// Secondary indexes; the PRIMARY index is reported as the primary key instead.
pub(crate) async fn indexes(pool: &MySqlPool, schema: &str, table: &str) -> Result<Vec<Index>> {
    let rows = sqlx::query(
        r#"
        SELECT
            CAST(INDEX_NAME AS CHAR) AS INDEX_NAME,
            CAST(COLUMN_NAME AS CHAR) AS COLUMN_NAME,
            CAST(NON_UNIQUE AS SIGNED) AS NON_UNIQUE,
            CAST(INDEX_TYPE AS CHAR) AS INDEX_TYPE
        FROM INFORMATION_SCHEMA.STATISTICS
        WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
        AND INDEX_NAME <> 'PRIMARY'
        ORDER BY INDEX_NAME, SEQ_IN_INDEX
    "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(|e| GatewayError::inspection_failed(table, "Failed to read indexes", e))?;

    let mut parts = Vec::with_capacity(rows.len());
    for row in &rows {
        let name: String = row.get_field("INDEX_NAME", table)?;
        parts.push((
            name,
            IndexPart {
                column: row.get_field("COLUMN_NAME", table)?,
                non_unique: row.get_field("NON_UNIQUE", table)?,
                index_type: row.get_field("INDEX_TYPE", table)?,
            },
        ));
    }

    Ok(group_ordered(parts)
        .into_iter()
        .map(|(name, parts)| {
            let unique = parts.iter().all(|p| p.non_unique == 0);
            let kind = parts
                .first()
                .and_then(|p| p.index_type.as_deref())
                .and_then(index_kind);
            Index {
                name,
                unique,
                columns: parts.into_iter().filter_map(|p| p.column).collect(),
                kind,
            }
        })
        .collect())
}

/// Only FULLTEXT and SPATIAL indexes carry a kind.
fn index_kind(index_type: &str) -> Option<String> {
    let upper = index_type.trim().to_ascii_uppercase();
    matches!(upper.as_str(), "FULLTEXT" | "SPATIAL").then_some(upper)
}

/// ON UPDATE / ON DELETE rules for every constraint in the schema.
pub(crate) async fn referential_rules(pool: &MySqlPool, schema: &str) -> Result<RuleMap> {
    let rows = sqlx::query(
        r#"
        SELECT
            CAST(CONSTRAINT_NAME AS CHAR) AS CONSTRAINT_NAME,
            CAST(UPDATE_RULE AS CHAR) AS UPDATE_RULE,
            CAST(DELETE_RULE AS CHAR) AS DELETE_RULE
        FROM INFORMATION_SCHEMA.REFERENTIAL_CONSTRAINTS
        WHERE CONSTRAINT_SCHEMA = ?
    "#,
    )
    .bind(schema)
    .fetch_all(pool)
    .await
    .map_err(|e| GatewayError::collection_failed("Failed to read referential constraints", e))?;

    let mut rules = RuleMap::with_capacity(rows.len());
    for row in &rows {
        let name: String = row
            .try_get("CONSTRAINT_NAME")
            .map_err(|e| GatewayError::collection_failed("Failed to read CONSTRAINT_NAME", e))?;
        let update_rule: Option<String> = row.try_get("UPDATE_RULE").ok().flatten();
        let delete_rule: Option<String> = row.try_get("DELETE_RULE").ok().flatten();
        rules.insert(
            name,
            ReferentialRule::parse(update_rule.as_deref(), delete_rule.as_deref()),
        );
    }

    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_ordered_keeps_first_appearance() {
        let groups = group_ordered(vec![("b", 1), ("a", 2), ("b", 3)]);
        assert_eq!(groups, vec![("b", vec![1, 3]), ("a", vec![2])]);
    }

    #[test]
    fn test_index_kind() {
        assert_eq!(index_kind("FULLTEXT"), Some("FULLTEXT".to_string()));
        assert_eq!(index_kind("spatial"), Some("SPATIAL".to_string()));
        assert_eq!(index_kind("BTREE"), None);
        assert_eq!(index_kind("HASH"), None);
    }
}
