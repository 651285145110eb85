use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::StreamExt;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls, RowStream};
use tracing::{debug, warn};

use super::config::PostgresOptions;
use super::query::postgres_extract_row;
use crate::credentials::Credentials;
use crate::driver::{Connection, Cursor, Driver};
use crate::error::SqlAccessError;
use crate::results::Row;
use crate::types::RowValues;

/// Opens a new tokio-postgres connection for every session.
///
/// Each connection owns a current-thread tokio runtime that drives the socket; calls
/// block on that runtime, so they must not be made from inside another async runtime.
#[derive(Debug, Clone, Default)]
pub struct PostgresDriver {
    options: PostgresOptions,
}

impl PostgresDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(options: PostgresOptions) -> Self {
        Self { options }
    }
}

impl Driver for PostgresDriver {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn connect(&self, credentials: &Credentials) -> Result<Box<dyn Connection>, SqlAccessError> {
        let pg_config = self.options.to_pg_config(credentials)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SqlAccessError::connection("failed to start postgres runtime", e))?;

        let (client, connection) = runtime.block_on(pg_config.connect(NoTls)).map_err(|e| {
            SqlAccessError::connection(
                format!(
                    "failed to connect to postgres at {}:{}",
                    self.options.host, self.options.port
                ),
                e,
            )
        })?;
        let task = runtime.spawn(async move {
            if let Err(e) = connection.await {
                warn!(error = %e, "postgres connection ended with error");
            }
        });
        debug!(host = %self.options.host, port = self.options.port, "postgres connection opened");

        Ok(Box::new(PgConnection {
            shared: Arc::new(PgShared {
                runtime,
                client,
                in_transaction: AtomicBool::new(false),
            }),
            task: Some(task),
        }))
    }
}

/// State shared between a connection and its cursors.
struct PgShared {
    runtime: Runtime,
    client: Client,
    /// Set by `begin`, cleared by commit/rollback.
    in_transaction: AtomicBool,
}

impl PgShared {
    fn begin(&self) -> Result<(), SqlAccessError> {
        if !self.in_transaction.load(Ordering::SeqCst) {
            self.runtime
                .block_on(self.client.batch_execute("BEGIN"))
                .map_err(|e| SqlAccessError::execution("postgres BEGIN failed", e))?;
            self.in_transaction.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    fn end_transaction(&self, verb: &str) -> Result<(), SqlAccessError> {
        if self.in_transaction.load(Ordering::SeqCst) {
            self.runtime
                .block_on(self.client.batch_execute(verb))
                .map_err(|e| SqlAccessError::execution(format!("postgres {verb} failed"), e))?;
            self.in_transaction.store(false, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn start(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<(Vec<String>, RowStream), SqlAccessError> {
        let exec_err = |e: tokio_postgres::Error| {
            SqlAccessError::execution(format!("postgres execute failed: {sql}"), e)
        };
        let statement = self.client.prepare(sql).await.map_err(exec_err)?;
        if statement.params().len() != params.len() {
            return Err(SqlAccessError::ParameterError(format!(
                "statement expects {} parameters, got {}",
                statement.params().len(),
                params.len()
            )));
        }
        let columns = statement
            .columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect();
        let stream = self
            .client
            .query_raw(&statement, params.iter())
            .await
            .map_err(exec_err)?;
        Ok((columns, stream))
    }
}

struct PgConnection {
    shared: Arc<PgShared>,
    task: Option<JoinHandle<()>>,
}

impl Connection for PgConnection {
    fn cursor(&mut self) -> Result<Box<dyn Cursor>, SqlAccessError> {
        Ok(Box::new(PgCursor {
            shared: Arc::clone(&self.shared),
            columns: None,
            stream: None,
        }))
    }

    fn begin(&mut self) -> Result<(), SqlAccessError> {
        self.shared.begin()
    }

    fn commit(&mut self) -> Result<(), SqlAccessError> {
        self.shared.end_transaction("COMMIT")
    }

    fn rollback(&mut self) -> Result<(), SqlAccessError> {
        self.shared.end_transaction("ROLLBACK")
    }

    fn close(mut self: Box<Self>) -> Result<(), SqlAccessError> {
        let task = self.task.take();
        match Arc::try_unwrap(self.shared) {
            Ok(PgShared {
                runtime, client, ..
            }) => {
                // Dropping the client lets the connection task send Terminate and finish.
                drop(client);
                if let Some(task) = task {
                    runtime.block_on(task).map_err(|e| {
                        SqlAccessError::connection("postgres connection task failed", e)
                    })?;
                }
                Ok(())
            }
            // A cursor still holds the client; the socket closes when it drops.
            Err(_) => Ok(()),
        }
    }
}

/// Rows are pulled from the server's `RowStream` one `next()` at a time.
struct PgCursor {
    shared: Arc<PgShared>,
    columns: Option<Vec<String>>,
    stream: Option<Pin<Box<RowStream>>>,
}

impl Cursor for PgCursor {
    fn execute(&mut self, sql: &str, params: &[RowValues]) -> Result<(), SqlAccessError> {
        self.columns = None;
        self.stream = None;
        let (columns, stream) = self
            .shared
            .runtime
            .block_on(self.shared.start(sql, params))?;
        self.columns = Some(columns);
        self.stream = Some(Box::pin(stream));
        Ok(())
    }

    fn description(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    fn fetch_one(&mut self) -> Result<Option<Row>, SqlAccessError> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(None);
        };
        match self.shared.runtime.block_on(stream.next()) {
            Some(Ok(row)) => postgres_extract_row(&row).map(Some),
            Some(Err(e)) => {
                self.stream = None;
                Err(SqlAccessError::execution("postgres fetch failed", e))
            }
            None => {
                self.stream = None;
                Ok(None)
            }
        }
    }

    fn close(self: Box<Self>) -> Result<(), SqlAccessError> {
        Ok(())
    }
}
