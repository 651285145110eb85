use std::time::Duration;

use crate::credentials::Credentials;
use crate::error::SqlAccessError;

/// Where and how the Postgres driver connects. Credentials are supplied separately.
#[derive(Debug, Clone)]
pub struct PostgresOptions {
    pub host: String,
    pub port: u16,
    /// Give up on establishing the TCP connection after this long.
    pub connect_timeout: Option<Duration>,
    /// Server-side `statement_timeout` for every statement on the connection.
    pub statement_timeout: Option<Duration>,
}

impl Default for PostgresOptions {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            connect_timeout: None,
            statement_timeout: None,
        }
    }
}

impl PostgresOptions {
    #[must_use]
    pub fn builder() -> PostgresOptionsBuilder {
        PostgresOptionsBuilder::default()
    }

    /// Combine these options with `credentials` into a `tokio_postgres::Config`.
    ///
    /// # Errors
    /// Returns `SqlAccessError::ConfigError` if the host is empty, or
    /// `SqlAccessError::ConnectionError` if the user or database name is missing.
    pub fn to_pg_config(
        &self,
        credentials: &Credentials,
    ) -> Result<tokio_postgres::Config, SqlAccessError> {
        if self.host.is_empty() {
            return Err(SqlAccessError::ConfigError("host is required".to_string()));
        }
        if credentials.user.is_empty() || credentials.database.is_empty() {
            return Err(SqlAccessError::ConnectionError {
                context: "postgres credentials need a user and a database".to_string(),
                source: None,
            });
        }

        let mut pg_config = tokio_postgres::Config::new();
        pg_config
            .host(&self.host)
            .port(self.port)
            .user(&credentials.user)
            .dbname(&credentials.database);
        if !credentials.password.is_empty() {
            pg_config.password(&credentials.password);
        }
        if let Some(timeout) = self.connect_timeout {
            pg_config.connect_timeout(timeout);
        }
        if let Some(timeout) = self.statement_timeout {
            pg_config.options(&format!("-c statement_timeout={}", timeout.as_millis()));
        }
        Ok(pg_config)
    }
}

/// Fluent builder for Postgres options.
#[derive(Debug, Clone, Default)]
pub struct PostgresOptionsBuilder {
    opts: PostgresOptions,
}

impl PostgresOptionsBuilder {
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.opts.host = host.into();
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.opts.port = port;
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.opts.connect_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn statement_timeout(mut self, timeout: Duration) -> Self {
        self.opts.statement_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn finish(self) -> PostgresOptions {
        self.opts
    }
}
