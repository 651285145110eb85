//! The seam between the access layer and a concrete backend.
//!
//! A [`Driver`] opens [`Connection`]s; a connection hands out [`Cursor`]s that
//! execute statements and yield rows one at a time. The access layer only ever talks
//! to these traits, which is also what lets tests substitute a recording double.

use crate::credentials::Credentials;
use crate::error::SqlAccessError;
use crate::results::Row;
use crate::types::RowValues;

pub trait Driver: Send + Sync {
    /// Short backend name used in log fields.
    fn name(&self) -> &'static str;

    /// Open a brand-new connection. Drivers never hand out shared or pooled
    /// connections.
    ///
    /// # Errors
    /// Returns `SqlAccessError::ConnectionError` if the store is unreachable or
    /// rejects the credentials.
    fn connect(&self, credentials: &Credentials) -> Result<Box<dyn Connection>, SqlAccessError>;
}

pub trait Connection: Send {
    /// # Errors
    /// Returns `SqlAccessError::ConnectionError` if the cursor cannot be created.
    fn cursor(&mut self) -> Result<Box<dyn Cursor>, SqlAccessError>;

    /// Open a transaction. Statements executed without one run in autocommit mode,
    /// so reads never hold a write transaction open.
    ///
    /// # Errors
    /// Returns `SqlAccessError::QueryExecutionError` if the store rejects `BEGIN`.
    fn begin(&mut self) -> Result<(), SqlAccessError>;

    /// Commit the transaction opened by [`Connection::begin`], if any.
    ///
    /// # Errors
    /// Returns `SqlAccessError::QueryExecutionError` if the store rejects the commit.
    fn commit(&mut self) -> Result<(), SqlAccessError>;

    /// Roll back the open transaction, if any.
    ///
    /// # Errors
    /// Returns `SqlAccessError::QueryExecutionError` if the rollback fails.
    fn rollback(&mut self) -> Result<(), SqlAccessError>;

    /// # Errors
    /// Returns `SqlAccessError::ConnectionError` if shutting the connection down fails.
    fn close(self: Box<Self>) -> Result<(), SqlAccessError>;
}

pub trait Cursor: Send {
    /// Execute `sql` with positional `params`. Rows become available through
    /// [`Cursor::fetch_one`]; some errors may only surface while fetching.
    ///
    /// # Errors
    /// Returns `SqlAccessError::QueryExecutionError` if the store rejects the statement,
    /// or `SqlAccessError::ParameterError` if `params` does not match its placeholders.
    fn execute(&mut self, sql: &str, params: &[RowValues]) -> Result<(), SqlAccessError>;

    /// Column names of the last executed statement; `None` before any execute.
    fn description(&self) -> Option<&[String]>;

    /// Pull the next row, or `None` once the result is exhausted.
    ///
    /// # Errors
    /// Returns `SqlAccessError::QueryExecutionError` on fetch or decode failures.
    fn fetch_one(&mut self) -> Result<Option<Row>, SqlAccessError>;

    /// Drain every remaining row.
    ///
    /// # Errors
    /// Propagates the first [`Cursor::fetch_one`] error.
    fn fetch_all(&mut self) -> Result<Vec<Row>, SqlAccessError> {
        let mut rows = Vec::new();
        while let Some(row) = self.fetch_one()? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// # Errors
    /// Returns an error if the backend fails to release the cursor.
    fn close(self: Box<Self>) -> Result<(), SqlAccessError>;
}
