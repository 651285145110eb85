use std::time::Duration;

/// Options applied to every `SQLite` connection the driver opens.
#[derive(Debug, Clone)]
pub struct SqliteOptions {
    /// How long a statement waits on a locked database before failing.
    pub busy_timeout: Option<Duration>,
    /// Switch the database to WAL journaling when connecting (on by default). With a
    /// rollback journal, a stream still being read blocks commits from other sessions.
    pub wal: bool,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self {
            busy_timeout: None,
            wal: true,
        }
    }
}

impl SqliteOptions {
    #[must_use]
    pub fn builder() -> SqliteOptionsBuilder {
        SqliteOptionsBuilder::new()
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone, Default)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.opts.busy_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn wal(mut self, wal: bool) -> Self {
        self.opts.wal = wal;
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }
}
