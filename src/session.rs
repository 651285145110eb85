//! Connection + cursor lifetime for a single logical operation.

use tracing::{debug, warn};

use crate::credentials::Credentials;
use crate::driver::{Connection, Cursor, Driver};
use crate::error::SqlAccessError;

/// One connection and one cursor, owned by exactly one operation or row stream.
///
/// Release order is always cursor first, then connection. Dropping a session that
/// was not released explicitly releases it.
pub struct Session {
    cursor: Option<Box<dyn Cursor>>,
    connection: Option<Box<dyn Connection>>,
    backend: &'static str,
}

impl Session {
    /// Open a new connection and a cursor on it.
    ///
    /// # Errors
    /// Returns `SqlAccessError::ConnectionError` if either cannot be opened. A
    /// connection whose cursor failed is closed before returning.
    pub fn open(driver: &dyn Driver, credentials: &Credentials) -> Result<Self, SqlAccessError> {
        let backend = driver.name();
        let mut connection = driver.connect(credentials)?;
        let cursor = match connection.cursor() {
            Ok(cursor) => cursor,
            Err(err) => {
                if let Err(close_err) = connection.close() {
                    warn!(backend, error = %close_err, "failed to close connection after cursor error");
                }
                return Err(err);
            }
        };
        debug!(backend, database = %credentials.database, "session opened");
        Ok(Self {
            cursor: Some(cursor),
            connection: Some(connection),
            backend,
        })
    }

    /// Invoke `op` with the open connection and cursor.
    ///
    /// # Errors
    /// Propagates the error `op` returns, or `SqlAccessError::ConnectionError` if the
    /// session was already released.
    pub fn run<T, F>(&mut self, op: F) -> Result<T, SqlAccessError>
    where
        F: FnOnce(&mut dyn Connection, &mut dyn Cursor) -> Result<T, SqlAccessError>,
    {
        match (self.connection.as_deref_mut(), self.cursor.as_deref_mut()) {
            (Some(connection), Some(cursor)) => op(connection, cursor),
            _ => Err(released_error()),
        }
    }

    pub(crate) fn cursor_mut(&mut self) -> Option<&mut dyn Cursor> {
        match self.cursor.as_deref_mut() {
            Some(cursor) => Some(cursor),
            None => None,
        }
    }

    pub(crate) fn cursor(&self) -> Option<&dyn Cursor> {
        match self.cursor.as_deref() {
            Some(cursor) => Some(cursor),
            None => None,
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.cursor.is_some() || self.connection.is_some()
    }

    /// Close the cursor, then the connection. Both are attempted even if the first
    /// close fails; the first error is returned. Releasing twice is a no-op.
    ///
    /// # Errors
    /// Returns the first close failure.
    pub fn release(&mut self) -> Result<(), SqlAccessError> {
        let cursor_result = self.cursor.take().map_or(Ok(()), |cursor| cursor.close());
        let connection_result = self
            .connection
            .take()
            .map_or(Ok(()), |connection| connection.close());
        debug!(backend = self.backend, "session released");
        cursor_result.and(connection_result)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.is_open() {
            debug!(backend = self.backend, "releasing session on drop");
            if let Err(err) = self.release() {
                warn!(backend = self.backend, error = %err, "failed to release session on drop");
            }
        }
    }
}

fn released_error() -> SqlAccessError {
    SqlAccessError::ConnectionError {
        context: "session already released".to_string(),
        source: None,
    }
}

/// Run `op` in a fresh session and release it on every exit path.
///
/// When `op` fails and the release fails as well, the release error is logged and
/// `op`'s error is returned.
///
/// # Errors
/// Returns connection errors from opening the session, `op`'s error, or a release
/// error after a successful `op`.
pub fn with_session<T, F>(
    driver: &dyn Driver,
    credentials: &Credentials,
    op: F,
) -> Result<T, SqlAccessError>
where
    F: FnOnce(&mut dyn Connection, &mut dyn Cursor) -> Result<T, SqlAccessError>,
{
    let mut session = Session::open(driver, credentials)?;
    let outcome = session.run(op);
    let released = session.release();
    match outcome {
        Ok(value) => released.map(|()| value),
        Err(err) => {
            if let Err(release_err) = released {
                warn!(backend = driver.name(), error = %release_err, "session release failed after operation error");
            }
            Err(err)
        }
    }
}
