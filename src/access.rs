use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::credentials::{self, CredentialSource, Credentials};
use crate::driver::{Connection, Cursor, Driver};
use crate::error::SqlAccessError;
use crate::probe::probe_statement;
use crate::results::{Row, Schema};
use crate::session::{Session, with_session};
use crate::stream::RowStream;
use crate::types::RowValues;

/// Whether a read refreshes the cached schema before fetching rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeMode {
    /// Run a zero-row probe first (one extra round trip).
    #[default]
    Refresh,
    /// Leave the cached schema as it is.
    Skip,
}

/// Access object that runs each call on its own short-lived connection.
///
/// Writes open a session, execute, commit and release. Reads either stream rows from a
/// session that lives as long as the returned [`RowStream`], or drain that stream into
/// a `Vec`. The column layout of the most recent probe is cached on the object.
///
/// ```no_run
/// use sql_access::prelude::*;
///
/// # fn main() -> Result<(), SqlAccessError> {
/// let credentials = Credentials::new("unused", "corpus.db", "unused");
/// let access = SqlQuery::with_credentials(SqliteDriver::new(), credentials);
/// let (rows, schema) = access.query_all(
///     "SELECT id, word FROM vocabulary WHERE pos = ?1;",
///     &[RowValues::Text("n".into())],
///     ProbeMode::Refresh,
/// )?;
/// for row in &rows {
///     let word = row.get(&schema, "word").and_then(RowValues::as_text);
///     # let _ = word;
/// }
/// # Ok(())
/// # }
/// ```
///
/// The schema cache is shared by every call on the same object. Concurrent probes of
/// differently shaped statements race and the last one to finish wins, so callers
/// mixing shapes across threads should use the `Schema` returned by
/// [`SqlQuery::probe_schema`] rather than [`SqlQuery::schema`].
pub struct SqlQuery {
    driver: Box<dyn Driver>,
    credentials: CredentialSource,
    schema: Mutex<Schema>,
}

impl SqlQuery {
    /// Access object that reads the process-wide credentials at every connect.
    #[must_use]
    pub fn new(driver: impl Driver + 'static) -> Self {
        Self::build(Box::new(driver), CredentialSource::Global)
    }

    /// Store the given credentials process-wide (when all three are non-empty, see
    /// [`credentials::configure`]) and build an access object that reads them.
    #[must_use]
    pub fn configured(
        driver: impl Driver + 'static,
        user: &str,
        database: &str,
        password: &str,
    ) -> Self {
        credentials::configure(user, database, password);
        Self::new(driver)
    }

    /// Access object bound to explicit credentials; the process-wide store is ignored.
    #[must_use]
    pub fn with_credentials(driver: impl Driver + 'static, credentials: Credentials) -> Self {
        Self::build(Box::new(driver), CredentialSource::Explicit(credentials))
    }

    fn build(driver: Box<dyn Driver>, credentials: CredentialSource) -> Self {
        Self {
            driver,
            credentials,
            schema: Mutex::new(Schema::default()),
        }
    }

    /// Snapshot of the schema cached by the last successful probe.
    #[must_use]
    pub fn schema(&self) -> Schema {
        self.schema_guard().clone()
    }

    fn schema_guard(&self) -> MutexGuard<'_, Schema> {
        self.schema.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn session_scope<T, F>(&self, op: F) -> Result<T, SqlAccessError>
    where
        F: FnOnce(&mut dyn Connection, &mut dyn Cursor) -> Result<T, SqlAccessError>,
    {
        let credentials = self.credentials.resolve()?;
        with_session(self.driver.as_ref(), &credentials, op)
    }

    /// Execute a write, commit, and return every row it produced (`RETURNING` rows).
    ///
    /// # Errors
    /// Returns `ConnectionError` if no session can be opened, or `QueryExecutionError`
    /// if execution or commit fails; the transaction is rolled back in that case.
    pub fn upsert(&self, sql: &str, params: &[RowValues]) -> Result<Vec<Row>, SqlAccessError> {
        debug!(backend = self.driver.name(), statement = sql, "upsert");
        self.session_scope(|connection, cursor| {
            write_and_commit(connection, cursor, sql, params)
        })
    }

    /// Execute an update and commit. Nothing is returned, whatever the row count.
    ///
    /// # Errors
    /// Same as [`SqlQuery::upsert`].
    pub fn update(&self, sql: &str, params: &[RowValues]) -> Result<(), SqlAccessError> {
        debug!(backend = self.driver.name(), statement = sql, "update");
        self.session_scope(|connection, cursor| {
            write_and_commit(connection, cursor, sql, params).map(drop)
        })
    }

    /// Execute a delete and commit. Nothing is returned, whatever the row count.
    ///
    /// # Errors
    /// Same as [`SqlQuery::upsert`].
    pub fn delete(&self, sql: &str, params: &[RowValues]) -> Result<(), SqlAccessError> {
        debug!(backend = self.driver.name(), statement = sql, "delete");
        self.session_scope(|connection, cursor| {
            write_and_commit(connection, cursor, sql, params).map(drop)
        })
    }

    /// Execute a statement and return its first row, without committing.
    ///
    /// # Errors
    /// Returns `ConnectionError` or `QueryExecutionError`.
    pub fn fetch_one(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Option<Row>, SqlAccessError> {
        debug!(backend = self.driver.name(), statement = sql, "fetch one");
        self.session_scope(|_connection, cursor| {
            cursor.execute(sql, params)?;
            cursor.fetch_one()
        })
    }

    /// Discover the column layout of `sql` with a zero-row probe and cache it.
    ///
    /// See [`probe_statement`] for how the probe is derived from `sql`.
    ///
    /// # Errors
    /// Returns `SchemaProbeError` when the store rejects the probe or it yields no
    /// columns, `ConnectionError` when no session can be opened. The cached schema is
    /// left unchanged on error.
    pub fn probe_schema(&self, sql: &str, params: &[RowValues]) -> Result<Schema, SqlAccessError> {
        let probe = probe_statement(sql);
        debug!(backend = self.driver.name(), statement = %probe, "probing result schema");
        let schema = self.session_scope(|_connection, cursor| {
            cursor
                .execute(&probe, params)
                .and_then(|()| cursor.fetch_all())
                .map_err(SqlAccessError::into_probe_error)?;
            match cursor.description() {
                Some(columns) if !columns.is_empty() => Ok(Schema::from_columns(columns.iter().cloned())),
                _ => Err(SqlAccessError::SchemaProbeError {
                    context: format!("probe returned no result columns: {probe}"),
                    source: None,
                }),
            }
        })?;

        let mut cached = self.schema_guard();
        if *cached != schema {
            debug!(columns = ?schema.columns(), "schema changed");
        }
        *cached = schema.clone();
        Ok(schema)
    }

    /// Execute `sql` and return a stream that pulls rows one at a time.
    ///
    /// The statement runs before this returns; the connection stays open until the
    /// stream is exhausted, fails, or is dropped. The schema cache is not touched.
    ///
    /// # Errors
    /// Returns `ConnectionError` or `QueryExecutionError` from opening the session or
    /// executing the statement; the session is released in both cases.
    pub fn stream_query(&self, sql: &str, params: &[RowValues]) -> Result<RowStream, SqlAccessError> {
        debug!(backend = self.driver.name(), statement = sql, "stream query");
        let credentials = self.credentials.resolve()?;
        let mut session = Session::open(self.driver.as_ref(), &credentials)?;
        session.run(|_connection, cursor| cursor.execute(sql, params))?;
        Ok(RowStream::new(session))
    }

    /// Probe (unless `probe` is [`ProbeMode::Skip`]) and then stream `sql`.
    ///
    /// # Errors
    /// Errors from [`SqlQuery::probe_schema`] or [`SqlQuery::stream_query`].
    pub fn query(
        &self,
        sql: &str,
        params: &[RowValues],
        probe: ProbeMode,
    ) -> Result<RowStream, SqlAccessError> {
        if probe == ProbeMode::Refresh {
            self.probe_schema(sql, params)?;
        }
        self.stream_query(sql, params)
    }

    /// Probe (unless skipped), drain the stream, and return the rows together with the
    /// cached schema.
    ///
    /// # Errors
    /// Errors from [`SqlQuery::query`] or from any row fetch.
    pub fn query_all(
        &self,
        sql: &str,
        params: &[RowValues],
        probe: ProbeMode,
    ) -> Result<(Vec<Row>, Schema), SqlAccessError> {
        let rows = self
            .query(sql, params, probe)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok((rows, self.schema()))
    }
}

/// Begin, execute, drain and commit. Draining makes errors that some drivers only
/// report while rows are read surface before the commit. Any failure rolls back.
fn write_and_commit(
    connection: &mut dyn Connection,
    cursor: &mut dyn Cursor,
    sql: &str,
    params: &[RowValues],
) -> Result<Vec<Row>, SqlAccessError> {
    let outcome = connection
        .begin()
        .and_then(|()| cursor.execute(sql, params))
        .and_then(|()| cursor.fetch_all())
        .and_then(|rows| connection.commit().map(|()| rows));
    if outcome.is_err() {
        if let Err(rollback_err) = connection.rollback() {
            warn!(error = %rollback_err, "rollback after failed write also failed");
        }
    }
    outcome
}
