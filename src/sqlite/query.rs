use rusqlite::types::Value;

use crate::error::SqlAccessError;
use crate::results::Row;
use crate::types::RowValues;

/// Extract a `RowValues` from a `SQLite` row.
///
/// # Errors
///
/// Returns `SqlAccessError::QueryExecutionError` if the value cannot be read.
pub fn sqlite_extract_value(row: &rusqlite::Row, idx: usize) -> Result<RowValues, SqlAccessError> {
    let value: Value = row
        .get(idx)
        .map_err(|e| SqlAccessError::execution(format!("sqlite read of column {idx} failed"), e))?;
    Ok(match value {
        Value::Null => RowValues::Null,
        Value::Integer(i) => RowValues::Int(i),
        Value::Real(f) => RowValues::Float(f),
        Value::Text(s) => RowValues::Text(s),
        Value::Blob(b) => RowValues::Blob(b),
    })
}

/// Decode every column of `row`.
///
/// # Errors
///
/// Propagates the first column that fails to decode.
pub fn sqlite_extract_row(row: &rusqlite::Row, column_count: usize) -> Result<Row, SqlAccessError> {
    let mut values = Vec::with_capacity(column_count);
    for idx in 0..column_count {
        values.push(sqlite_extract_value(row, idx)?);
    }
    Ok(Row::new(values))
}
