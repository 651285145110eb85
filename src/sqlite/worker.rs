//! A rusqlite connection owned by a dedicated thread.
//!
//! rusqlite statements borrow their connection, so a statement that is being stepped
//! lazily cannot live next to the connection in a handle. The worker thread keeps
//! both on its own stack and steps the statement one row per request.

mod channel;
mod dispatcher;

use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use tracing::debug;

pub(crate) use channel::TxVerb;
use channel::Command;
use dispatcher::run_sqlite_worker;

use super::params::Params;
use crate::error::SqlAccessError;
use crate::results::Row;
use crate::types::RowValues;

pub(crate) struct SqliteWorker {
    sender: Sender<Command>,
    thread: JoinHandle<()>,
}

impl SqliteWorker {
    pub(crate) fn spawn(conn: rusqlite::Connection, path: &str) -> Result<Self, SqlAccessError> {
        let (sender, receiver) = mpsc::channel::<Command>();
        let thread = thread::Builder::new()
            .name(format!("sqlite-worker-{path}"))
            .spawn(move || run_sqlite_worker(conn, &receiver))
            .map_err(|e| SqlAccessError::connection("failed to spawn sqlite worker thread", e))?;
        debug!(path, "sqlite worker started");
        Ok(Self { sender, thread })
    }

    fn request<T>(
        &self,
        command: impl FnOnce(Sender<T>) -> Command,
    ) -> Result<T, SqlAccessError> {
        let (respond_to, response) = mpsc::channel();
        self.sender
            .send(command(respond_to))
            .map_err(|_| worker_closed())?;
        response.recv().map_err(|_| worker_closed())
    }

    pub(crate) fn execute(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Vec<String>, SqlAccessError> {
        self.request(|respond_to| Command::Execute {
            sql: sql.to_string(),
            params: Params::convert(params),
            respond_to,
        })?
    }

    pub(crate) fn fetch(&self) -> Result<Option<Row>, SqlAccessError> {
        self.request(|respond_to| Command::Fetch { respond_to })?
    }

    pub(crate) fn finish(&self) -> Result<(), SqlAccessError> {
        self.request(|respond_to| Command::Finish { respond_to })
    }

    pub(crate) fn transaction(&self, verb: TxVerb) -> Result<(), SqlAccessError> {
        self.request(|respond_to| Command::Transaction { verb, respond_to })?
    }

    /// Close the connection on the worker and wait for the thread to exit.
    pub(crate) fn shutdown(self) -> Result<(), SqlAccessError> {
        let closed = self.request(|respond_to| Command::Shutdown { respond_to });
        let Self { sender, thread } = self;
        drop(sender);
        thread.join().map_err(|_| SqlAccessError::ConnectionError {
            context: "sqlite worker thread panicked".to_string(),
            source: None,
        })?;
        closed?
    }
}

fn worker_closed() -> SqlAccessError {
    SqlAccessError::ConnectionError {
        context: "sqlite worker closed".to_string(),
        source: None,
    }
}
