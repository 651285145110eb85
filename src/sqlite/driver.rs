use std::sync::Arc;

use tracing::debug;

use super::config::SqliteOptions;
use super::worker::{SqliteWorker, TxVerb};
use crate::credentials::Credentials;
use crate::driver::{Connection, Cursor, Driver};
use crate::error::SqlAccessError;
use crate::results::Row;
use crate::types::RowValues;

/// Opens a new rusqlite connection to `Credentials::database` for every session.
#[derive(Debug, Clone, Default)]
pub struct SqliteDriver {
    options: SqliteOptions,
}

impl SqliteDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(options: SqliteOptions) -> Self {
        Self { options }
    }
}

impl Driver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn connect(&self, credentials: &Credentials) -> Result<Box<dyn Connection>, SqlAccessError> {
        let path = credentials.database.as_str();
        if path.is_empty() {
            return Err(SqlAccessError::ConnectionError {
                context: "sqlite database path is empty".to_string(),
                source: None,
            });
        }
        let conn = rusqlite::Connection::open(path).map_err(|e| {
            SqlAccessError::connection(format!("failed to open sqlite database {path}"), e)
        })?;
        if let Some(timeout) = self.options.busy_timeout {
            conn.busy_timeout(timeout)
                .map_err(|e| SqlAccessError::connection("failed to set sqlite busy timeout", e))?;
        }
        if self.options.wal {
            conn.execute_batch("PRAGMA journal_mode = WAL;")
                .map_err(|e| SqlAccessError::connection("failed to enable sqlite WAL", e))?;
        }
        debug!(path, "sqlite connection opened");
        Ok(Box::new(SqliteConnection {
            worker: Arc::new(SqliteWorker::spawn(conn, path)?),
        }))
    }
}

/// Handle to the worker thread that owns the rusqlite connection.
///
/// Statements run in autocommit mode unless [`Connection::begin`] opened a
/// transaction, so an open read stream does not hold a write transaction.
struct SqliteConnection {
    worker: Arc<SqliteWorker>,
}

impl Connection for SqliteConnection {
    fn cursor(&mut self) -> Result<Box<dyn Cursor>, SqlAccessError> {
        Ok(Box::new(SqliteCursor {
            worker: Arc::clone(&self.worker),
            columns: None,
        }))
    }

    fn begin(&mut self) -> Result<(), SqlAccessError> {
        self.worker.transaction(TxVerb::Begin)
    }

    fn commit(&mut self) -> Result<(), SqlAccessError> {
        self.worker.transaction(TxVerb::Commit)
    }

    fn rollback(&mut self) -> Result<(), SqlAccessError> {
        self.worker.transaction(TxVerb::Rollback)
    }

    fn close(self: Box<Self>) -> Result<(), SqlAccessError> {
        match Arc::try_unwrap(self.worker) {
            Ok(worker) => worker.shutdown(),
            // A cursor still holds the worker; it stops once that cursor drops.
            Err(_) => Ok(()),
        }
    }
}

/// Each `fetch_one` steps the statement on the worker exactly once.
struct SqliteCursor {
    worker: Arc<SqliteWorker>,
    columns: Option<Vec<String>>,
}

impl Cursor for SqliteCursor {
    fn execute(&mut self, sql: &str, params: &[RowValues]) -> Result<(), SqlAccessError> {
        self.columns = None;
        self.columns = Some(self.worker.execute(sql, params)?);
        Ok(())
    }

    fn description(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    fn fetch_one(&mut self) -> Result<Option<Row>, SqlAccessError> {
        if self.columns.is_none() {
            return Ok(None);
        }
        self.worker.fetch()
    }

    fn close(self: Box<Self>) -> Result<(), SqlAccessError> {
        self.worker.finish()
    }
}
