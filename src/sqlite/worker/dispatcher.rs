use std::sync::mpsc::{Receiver, Sender};

use rusqlite::params_from_iter;

use super::channel::{Command, TxVerb};
use crate::error::SqlAccessError;
use crate::sqlite::params::Params;
use crate::sqlite::query::sqlite_extract_row;

pub(super) fn run_sqlite_worker(conn: rusqlite::Connection, receiver: &Receiver<Command>) {
    let mut pending = receiver.recv().ok();
    while let Some(command) = pending.take() {
        pending = match command {
            Command::Execute {
                sql,
                params,
                respond_to,
            } => run_statement(&conn, &sql, &params, &respond_to, receiver),
            Command::Fetch { respond_to } => {
                let _ = respond_to.send(Ok(None));
                receiver.recv().ok()
            }
            Command::Finish { respond_to } => {
                let _ = respond_to.send(());
                receiver.recv().ok()
            }
            Command::Transaction { verb, respond_to } => {
                let _ = respond_to.send(transaction(&conn, verb));
                receiver.recv().ok()
            }
            Command::Shutdown { respond_to } => {
                let closed = conn.close().map_err(|(_, e)| {
                    SqlAccessError::connection("failed to close sqlite connection", e)
                });
                let _ = respond_to.send(closed);
                return;
            }
        };
    }
}

fn transaction(conn: &rusqlite::Connection, verb: TxVerb) -> Result<(), SqlAccessError> {
    // BEGIN only from autocommit; COMMIT/ROLLBACK only inside a transaction.
    let applies = match verb {
        TxVerb::Begin => conn.is_autocommit(),
        TxVerb::Commit | TxVerb::Rollback => !conn.is_autocommit(),
    };
    if applies {
        conn.execute_batch(verb.sql())
            .map_err(|e| SqlAccessError::execution(format!("sqlite {} failed", verb.sql()), e))?;
    }
    Ok(())
}

/// Serve fetches from one live statement. Returns the first command that is not a
/// fetch, after the statement has been dropped, or `None` once every sender is gone.
fn run_statement(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &Params,
    respond_to: &Sender<Result<Vec<String>, SqlAccessError>>,
    receiver: &Receiver<Command>,
) -> Option<Command> {
    let mut stmt = match conn.prepare(sql) {
        Ok(stmt) => stmt,
        Err(e) => {
            let _ = respond_to.send(Err(SqlAccessError::execution(
                format!("sqlite prepare failed: {sql}"),
                e,
            )));
            return receiver.recv().ok();
        }
    };
    let columns: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let column_count = columns.len();
    if stmt.parameter_count() != params.as_values().len() {
        let _ = respond_to.send(Err(SqlAccessError::ParameterError(format!(
            "statement expects {} parameters, got {}",
            stmt.parameter_count(),
            params.as_values().len()
        ))));
        return receiver.recv().ok();
    }
    let mut rows = match stmt.query(params_from_iter(params.as_values())) {
        Ok(rows) => rows,
        Err(e) => {
            let _ = respond_to.send(Err(SqlAccessError::execution("sqlite execute failed", e)));
            return receiver.recv().ok();
        }
    };
    let _ = respond_to.send(Ok(columns));

    let mut done = false;
    loop {
        match receiver.recv().ok()? {
            Command::Fetch { respond_to } => {
                let fetched = if done {
                    Ok(None)
                } else {
                    match rows.next() {
                        Ok(Some(row)) => sqlite_extract_row(row, column_count).map(Some),
                        Ok(None) => Ok(None),
                        Err(e) => Err(SqlAccessError::execution("sqlite step failed", e)),
                    }
                };
                done = !matches!(fetched, Ok(Some(_)));
                let _ = respond_to.send(fetched);
            }
            other => return Some(other),
        }
    }
}
