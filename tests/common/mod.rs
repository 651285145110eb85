#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use sql_access::prelude::*;

/// One call observed by the recording driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Connect,
    OpenCursor,
    Begin,
    Execute(String),
    Commit,
    Rollback,
    CloseCursor,
    CloseConnection,
}

#[derive(Debug, Clone)]
enum Outcome {
    Rows { columns: Vec<String>, rows: Vec<Row> },
    FailExecute(String),
    /// Execute succeeds; the error shows up on the first fetch.
    FailFetch(String),
}

#[derive(Default)]
struct State {
    events: Vec<Event>,
    outcomes: HashMap<String, Outcome>,
    refuse_connect: bool,
    fail_commit: bool,
    databases: Vec<String>,
    fetches: usize,
}

/// Scriptable driver that records every connection/cursor call.
///
/// Statements that were not scripted execute successfully with no columns and no rows.
#[derive(Clone, Default)]
pub struct RecordingDriver {
    state: Arc<Mutex<State>>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn script_rows(&self, sql: &str, columns: &[&str], rows: Vec<Vec<RowValues>>) {
        self.state().outcomes.insert(
            sql.to_string(),
            Outcome::Rows {
                columns: columns.iter().map(ToString::to_string).collect(),
                rows: rows.into_iter().map(Row::new).collect(),
            },
        );
    }

    pub fn script_execute_failure(&self, sql: &str, message: &str) {
        self.state()
            .outcomes
            .insert(sql.to_string(), Outcome::FailExecute(message.to_string()));
    }

    pub fn script_fetch_failure(&self, sql: &str, message: &str) {
        self.state()
            .outcomes
            .insert(sql.to_string(), Outcome::FailFetch(message.to_string()));
    }

    pub fn refuse_connections(&self) {
        self.state().refuse_connect = true;
    }

    pub fn fail_commits(&self) {
        self.state().fail_commit = true;
    }

    pub fn events(&self) -> Vec<Event> {
        self.state().events.clone()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.state().events.iter().filter(|e| *e == event).count()
    }

    pub fn executed(&self) -> Vec<String> {
        self.state()
            .events
            .iter()
            .filter_map(|e| match e {
                Event::Execute(sql) => Some(sql.clone()),
                _ => None,
            })
            .collect()
    }

    /// Database names passed to every successful connect, in order.
    pub fn databases(&self) -> Vec<String> {
        self.state().databases.clone()
    }

    /// Number of `fetch_one` calls made on any cursor.
    pub fn fetches(&self) -> usize {
        self.state().fetches
    }

    /// Connections opened minus connections closed.
    pub fn open_connections(&self) -> usize {
        self.count(&Event::Connect) - self.count(&Event::CloseConnection)
    }

    fn record(&self, event: Event) {
        self.state().events.push(event);
    }
}

impl Driver for RecordingDriver {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn connect(&self, credentials: &Credentials) -> Result<Box<dyn Connection>, SqlAccessError> {
        if self.state().refuse_connect {
            return Err(SqlAccessError::connection(
                format!("refused connection to {}", credentials.database),
                "password authentication failed",
            ));
        }
        {
            let mut state = self.state();
            state.events.push(Event::Connect);
            state.databases.push(credentials.database.clone());
        }
        Ok(Box::new(RecordingConnection {
            driver: self.clone(),
        }))
    }
}

struct RecordingConnection {
    driver: RecordingDriver,
}

impl Connection for RecordingConnection {
    fn cursor(&mut self) -> Result<Box<dyn Cursor>, SqlAccessError> {
        self.driver.record(Event::OpenCursor);
        Ok(Box::new(RecordingCursor {
            driver: self.driver.clone(),
            columns: None,
            rows: VecDeque::new(),
            fetch_error: None,
        }))
    }

    fn begin(&mut self) -> Result<(), SqlAccessError> {
        self.driver.record(Event::Begin);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), SqlAccessError> {
        self.driver.record(Event::Commit);
        if self.driver.state().fail_commit {
            return Err(SqlAccessError::execution("commit failed", "serialization failure"));
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), SqlAccessError> {
        self.driver.record(Event::Rollback);
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), SqlAccessError> {
        self.driver.record(Event::CloseConnection);
        Ok(())
    }
}

struct RecordingCursor {
    driver: RecordingDriver,
    columns: Option<Vec<String>>,
    rows: VecDeque<Row>,
    fetch_error: Option<String>,
}

impl Cursor for RecordingCursor {
    fn execute(&mut self, sql: &str, _params: &[RowValues]) -> Result<(), SqlAccessError> {
        self.driver.record(Event::Execute(sql.to_string()));
        let outcome = self.driver.state().outcomes.get(sql).cloned();
        self.rows.clear();
        self.fetch_error = None;
        match outcome {
            Some(Outcome::Rows { columns, rows }) => {
                self.columns = Some(columns);
                self.rows = rows.into();
            }
            Some(Outcome::FailExecute(message)) => {
                return Err(SqlAccessError::execution("execute failed", message));
            }
            Some(Outcome::FailFetch(message)) => {
                self.columns = Some(Vec::new());
                self.fetch_error = Some(message);
            }
            None => self.columns = Some(Vec::new()),
        }
        Ok(())
    }

    fn description(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    fn fetch_one(&mut self) -> Result<Option<Row>, SqlAccessError> {
        self.driver.state().fetches += 1;
        if let Some(message) = self.fetch_error.take() {
            return Err(SqlAccessError::execution("fetch failed", message));
        }
        Ok(self.rows.pop_front())
    }

    fn close(self: Box<Self>) -> Result<(), SqlAccessError> {
        self.driver.record(Event::CloseCursor);
        Ok(())
    }
}

pub fn test_credentials() -> Credentials {
    Credentials::new("tester", "corpus", "secret")
}

pub fn vocab_rows() -> Vec<Vec<RowValues>> {
    vec![
        vec![RowValues::Int(1), RowValues::Text("你好".into())],
        vec![RowValues::Int(2), RowValues::Text("hello".into())],
        vec![RowValues::Int(3), RowValues::Text("world".into())],
    ]
}
