//! Query backend capability
//!
//! The contract the statement interpreter requires from the wire-level SQL
//! client: execute one rendered query to completion and hand back column
//! names, rows and row counts. The production implementation drives a
//! pooled sqlx connection; embedders and tests may substitute their own.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use futures::TryStreamExt;
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySql, MySqlRow};
use sqlx::pool::PoolConnection;
use sqlx::{Column, Either, Row, TypeInfo};

use crate::error::{Error, Result};
use crate::types::Value;

/// A rendered query: SQL text with `?` placeholders plus the values bound
/// to them, in order
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl PreparedQuery {
    /// A parameterless query from raw SQL text
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }
}

/// Outcome of one query: column names, JSON-ready rows, row counts
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<JsonValue>>,
    pub affected_rows: u64,
    pub changed_rows: u64,
}

/// Capability contract of the wire-level SQL client
#[async_trait]
pub trait QueryBackend: Send {
    /// Execute one query to completion
    async fn run(&mut self, query: &PreparedQuery) -> Result<ResultSet>;
}

/// Render a resultset cell as literal text for type conversion
pub fn cell_literal(cell: &JsonValue) -> Result<String> {
    match cell {
        JsonValue::String(value) => Ok(value.clone()),
        JsonValue::Number(value) => Ok(value.to_string()),
        JsonValue::Bool(value) => Ok(Value::Boolean(*value).to_literal()),
        other => Err(Error::Internal(format!(
            "cannot render cell '{other}' as a literal"
        ))),
    }
}

/// Production backend over one pooled sqlx connection
pub struct SqlxBackend {
    connection: PoolConnection<MySql>,
}

impl SqlxBackend {
    pub fn new(connection: PoolConnection<MySql>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl QueryBackend for SqlxBackend {
    async fn run(&mut self, query: &PreparedQuery) -> Result<ResultSet> {
        let mut prepared = sqlx::query(&query.sql);
        for param in &query.params {
            prepared = match param {
                Value::Boolean(value) => prepared.bind(*value),
                Value::Date(value) => prepared.bind(*value),
                Value::Datetime(value) => prepared.bind(*value),
                Value::Int(value) => prepared.bind(*value),
                Value::String(value) => prepared.bind(value.clone()),
                // the rendered SQL wraps this in its conversion expression
                Value::Uuid(value) => prepared.bind(value.to_string()),
            };
        }

        let mut result = ResultSet::default();
        let mut stream = prepared.fetch_many(&mut *self.connection);
        while let Some(item) = stream.try_next().await? {
            match item {
                Either::Left(outcome) => {
                    // the driver reports a single row counter; both counts
                    // observe it
                    result.affected_rows = outcome.rows_affected();
                    result.changed_rows = outcome.rows_affected();
                }
                Either::Right(row) => {
                    if result.columns.is_empty() {
                        result.columns = row
                            .columns()
                            .iter()
                            .map(|column| column.name().to_string())
                            .collect();
                    }
                    result.rows.push(decode_row(&row)?);
                }
            }
        }
        Ok(result)
    }
}

fn decode_row(row: &MySqlRow) -> Result<Vec<JsonValue>> {
    let mut cells = Vec::with_capacity(row.columns().len());
    for column in row.columns() {
        cells.push(decode_cell(row, column.ordinal(), column.type_info().name())?);
    }
    Ok(cells)
}

/// Decode one cell into a JSON value by the column's declared type
fn decode_cell(row: &MySqlRow, index: usize, type_name: &str) -> Result<JsonValue> {
    let cell = match type_name {
        "NULL" => None,
        "BOOLEAN" => row.try_get::<Option<bool>, _>(index)?.map(JsonValue::Bool),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => row
            .try_get::<Option<i64>, _>(index)?
            .map(JsonValue::from),
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => row
            .try_get::<Option<u64>, _>(index)?
            .map(JsonValue::from),
        "FLOAT" | "DOUBLE" => row
            .try_get::<Option<f64>, _>(index)?
            .map(JsonValue::from),
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(index)?
            .map(|value| JsonValue::String(value.format("%Y-%m-%d").to_string())),
        "DATETIME" | "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(index)?
            .map(|value| JsonValue::String(value.format("%Y-%m-%dT%H:%M:%S").to_string())),
        // CHAR/VARCHAR/TEXT/ENUM/DECIMAL and anything else textual
        _ => row.try_get::<Option<String>, _>(index)?.map(JsonValue::String),
    };
    Ok(cell.unwrap_or(JsonValue::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_query_has_no_params() {
        let query = PreparedQuery::raw("ROLLBACK");
        assert_eq!(query.sql, "ROLLBACK");
        assert!(query.params.is_empty());
    }

    #[test]
    fn test_cell_literal() {
        assert_eq!(cell_literal(&JsonValue::from("abc")).unwrap(), "abc");
        assert_eq!(cell_literal(&JsonValue::from(42)).unwrap(), "42");
        assert_eq!(cell_literal(&JsonValue::Bool(true)).unwrap(), "true");
        assert!(cell_literal(&JsonValue::Null).is_err());
    }
}
