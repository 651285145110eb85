//! Lazily pulled query results that own their session.

use std::iter::FusedIterator;

use tracing::{debug, warn};

use crate::error::SqlAccessError;
use crate::results::Row;
use crate::session::Session;

/// Rows pulled one at a time from a cursor that stays open for the stream's lifetime.
///
/// The session is released as soon as the cursor reports the end of the result, when
/// a fetch fails, or when the stream is dropped part-way through. Re-issue the query
/// to read the rows again.
pub struct RowStream {
    session: Option<Session>,
    yielded: usize,
}

impl RowStream {
    pub(crate) fn new(session: Session) -> Self {
        Self {
            session: Some(session),
            yielded: 0,
        }
    }

    /// True until the stream has released its connection.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_open)
    }

    /// Column names reported by the cursor, while the stream is open.
    #[must_use]
    pub fn columns(&self) -> Option<Vec<String>> {
        self.session
            .as_ref()
            .and_then(Session::cursor)
            .and_then(|cursor| cursor.description())
            .map(<[String]>::to_vec)
    }

    /// Release the connection now, discarding any rows not yet pulled.
    ///
    /// # Errors
    /// Returns the failure from closing the cursor or the connection.
    pub fn close(mut self) -> Result<(), SqlAccessError> {
        self.finish()
    }

    fn finish(&mut self) -> Result<(), SqlAccessError> {
        match self.session.take() {
            Some(mut session) => {
                debug!(rows = self.yielded, "row stream finished");
                session.release()
            }
            None => Ok(()),
        }
    }
}

impl Iterator for RowStream {
    type Item = Result<Row, SqlAccessError>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.session.as_mut()?.cursor_mut()?;
        match cursor.fetch_one() {
            Ok(Some(row)) => {
                self.yielded += 1;
                Some(Ok(row))
            }
            Ok(None) => self.finish().err().map(Err),
            Err(err) => {
                if let Err(release_err) = self.finish() {
                    debug!(error = %release_err, "release failed after fetch error");
                }
                Some(Err(err))
            }
        }
    }
}

impl FusedIterator for RowStream {}

impl Drop for RowStream {
    fn drop(&mut self) {
        if self.session.is_some() {
            debug!(rows = self.yielded, "row stream dropped before exhaustion");
        }
        if let Err(err) = self.finish() {
            warn!(error = %err, "failed to release abandoned row stream");
        }
    }
}
