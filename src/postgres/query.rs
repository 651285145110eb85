use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use tokio_postgres::types::Type;

use crate::error::SqlAccessError;
use crate::results::Row;
use crate::types::RowValues;

fn decode_error(idx: usize, err: tokio_postgres::Error) -> SqlAccessError {
    SqlAccessError::execution(format!("postgres decode of column {idx} failed"), err)
}

/// Extracts a `RowValues` from a `tokio_postgres` Row at the given index.
///
/// # Errors
/// Returns `SqlAccessError::QueryExecutionError` if the column cannot be decoded.
pub fn postgres_extract_value(
    row: &tokio_postgres::Row,
    idx: usize,
) -> Result<RowValues, SqlAccessError> {
    let type_info = row.columns()[idx].type_();
    let get_err = |e| decode_error(idx, e);

    let value = match *type_info {
        Type::INT2 => row
            .try_get::<_, Option<i16>>(idx)
            .map_err(get_err)?
            .map(|v| RowValues::Int(i64::from(v))),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(idx)
            .map_err(get_err)?
            .map(|v| RowValues::Int(i64::from(v))),
        Type::INT8 => row
            .try_get::<_, Option<i64>>(idx)
            .map_err(get_err)?
            .map(RowValues::Int),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(idx)
            .map_err(get_err)?
            .map(|v| RowValues::Float(f64::from(v))),
        Type::FLOAT8 => row
            .try_get::<_, Option<f64>>(idx)
            .map_err(get_err)?
            .map(RowValues::Float),
        Type::BOOL => row
            .try_get::<_, Option<bool>>(idx)
            .map_err(get_err)?
            .map(RowValues::Bool),
        Type::TIMESTAMP => row
            .try_get::<_, Option<NaiveDateTime>>(idx)
            .map_err(get_err)?
            .map(RowValues::Timestamp),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<DateTime<Utc>>>(idx)
            .map_err(get_err)?
            .map(|v| RowValues::Timestamp(v.naive_utc())),
        Type::DATE => row
            .try_get::<_, Option<NaiveDate>>(idx)
            .map_err(get_err)?
            .map(|v| RowValues::Timestamp(v.and_time(chrono::NaiveTime::MIN))),
        Type::JSON | Type::JSONB => row
            .try_get::<_, Option<Value>>(idx)
            .map_err(get_err)?
            .map(RowValues::JSON),
        Type::BYTEA => row
            .try_get::<_, Option<Vec<u8>>>(idx)
            .map_err(get_err)?
            .map(RowValues::Blob),
        // Text-like and anything else the driver can hand over as a string.
        _ => row
            .try_get::<_, Option<String>>(idx)
            .map_err(get_err)?
            .map(RowValues::Text),
    };
    Ok(value.unwrap_or(RowValues::Null))
}

/// Decode every column of `row`.
///
/// # Errors
/// Propagates the first column that fails to decode.
pub fn postgres_extract_row(row: &tokio_postgres::Row) -> Result<Row, SqlAccessError> {
    let col_count = row.columns().len();
    let mut values = Vec::with_capacity(col_count);
    for idx in 0..col_count {
        values.push(postgres_extract_value(row, idx)?);
    }
    Ok(Row::new(values))
}
