//! Row sampling and value decoding for MySQL/MariaDB.
//!
//! Values are decoded by the column's reported type into the narrowest Rust
//! type, then handed to [`crate::normalize`]. Zero or otherwise invalid
//! dates (`0000-00-00`) become NULL. Columns whose type is not recognized
//! fall back through a chain of decoders ending in raw bytes, so decoding
//! never fails for a non-NULL value.

use crate::error::GatewayError;
use crate::models::{Row, SqlValue};
use crate::normalize;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::mysql::types::MySqlTime;
use sqlx::{Column, MySql, MySqlPool, Row as _, TypeInfo, ValueRef};

/// Quotes an identifier with backticks, doubling embedded backticks.
pub fn quote_identifier(identifier: &str) -> String {
    format!("`{}`", identifier.replace('`', "``"))
}

/// Builds the bounded sample statement for a table.
pub fn sample_query(schema: &str, table: &str, columns: &[String]) -> String {
    let select_list = if columns.is_empty() {
        "*".to_string()
    } else {
        columns
            .iter()
            .map(|c| quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "SELECT {} FROM {}.{} LIMIT ?",
        select_list,
        quote_identifier(schema),
        quote_identifier(table)
    )
}

/// Fetches up to `limit` rows of a table, decoded and normalized.
///
/// # Errors
/// Returns a table inspection error if the query fails.
pub async fn sample_rows(
    pool: &MySqlPool,
    schema: &str,
    table: &str,
    columns: &[String],
    limit: u32,
) -> crate::Result<Vec<Row>> {
    let query = sample_query(schema, table, columns);
    tracing::debug!("Sampling up to {} rows from {}.{}", limit, schema, table);

    let rows = sqlx::query(&query)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            GatewayError::inspection_failed(
                table,
                format!("Failed to sample data from table '{}.{}'", schema, table),
                e,
            )
        })?;

    Ok(rows.iter().map(decode_row).collect())
}

/// Decodes every column of a row into normalized values, in select-list order.
pub fn decode_row(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .map(|column| {
            let value = decode_value(row, column.ordinal(), column.type_info().name());
            (column.name().to_string(), value)
        })
        .collect()
}

/// Decodes one column value.
pub fn decode_value(row: &MySqlRow, index: usize, type_name: &str) -> SqlValue {
    match row.try_get_raw(index) {
        Ok(raw) if !raw.is_null() => {}
        _ => return SqlValue::Null,
    }

    decode_typed(row, index, type_name).unwrap_or_else(|| decode_fallback(row, index))
}

fn decode<'r, T>(row: &'r MySqlRow, index: usize) -> Option<T>
where
    T: sqlx::Decode<'r, MySql>,
{
    row.try_get_unchecked::<T, _>(index).ok()
}

fn decode_typed(row: &MySqlRow, index: usize, type_name: &str) -> Option<SqlValue> {
    let type_name = type_name.to_ascii_uppercase();
    match type_name.as_str() {
        "BOOLEAN" => decode::<bool>(row, index).map(SqlValue::Bool),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            decode::<i64>(row, index).map(SqlValue::Integer)
        }
        t if t.ends_with(" UNSIGNED") => decode::<u64>(row, index).map(normalize::from_u64),
        "YEAR" => decode::<u16>(row, index).map(|y| SqlValue::Integer(i64::from(y))),
        "FLOAT" => decode::<f32>(row, index).map(|v| normalize::from_f64(f64::from(v))),
        "DOUBLE" => decode::<f64>(row, index).map(normalize::from_f64),
        "DECIMAL" => decode::<String>(row, index).map(|s| normalize::from_decimal_text(&s)),
        "DATE" => Some(decode::<NaiveDate>(row, index).map_or(SqlValue::Null, normalize::from_date)),
        "TIME" => decode::<MySqlTime>(row, index).map(|time| interval_to_value(&time)),
        "DATETIME" => Some(
            decode::<NaiveDateTime>(row, index).map_or(SqlValue::Null, normalize::from_datetime),
        ),
        "TIMESTAMP" => Some(
            decode::<DateTime<Utc>>(row, index).map_or(SqlValue::Null, normalize::from_timestamp),
        ),
        "BIT" => decode::<Vec<u8>>(row, index).map(|bytes| bits_to_value(&bytes)),
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "GEOMETRY" => {
            decode::<Vec<u8>>(row, index).map(|bytes| normalize::from_bytes(&bytes))
        }
        _ => decode::<String>(row, index).map(SqlValue::Text),
    }
}

/// Tries progressively looser decoders; raw bytes always succeed.
fn decode_fallback(row: &MySqlRow, index: usize) -> SqlValue {
    if let Ok(v) = row.try_get::<String, _>(index) {
        return SqlValue::Text(v);
    }
    if let Ok(v) = row.try_get::<i64, _>(index) {
        return SqlValue::Integer(v);
    }
    if let Ok(v) = row.try_get::<f64, _>(index) {
        return normalize::from_f64(v);
    }
    if let Ok(v) = row.try_get::<bool, _>(index) {
        return SqlValue::Bool(v);
    }
    decode::<Vec<u8>>(row, index).map_or(SqlValue::Null, |bytes| normalize::from_bytes(&bytes))
}

/// `TIME` keeps its sign and its full hour range.
fn interval_to_value(time: &MySqlTime) -> SqlValue {
    normalize::from_interval(
        time.is_negative(),
        time.hours(),
        time.minutes(),
        time.seconds(),
        time.microseconds(),
    )
}

/// BIT(n) values arrive big-endian; up to 64 bits become an integer.
fn bits_to_value(bytes: &[u8]) -> SqlValue {
    if bytes.len() > 8 {
        return normalize::from_bytes(bytes);
    }
    let value = bytes
        .iter()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte));
    normalize::from_u64(value)
}
