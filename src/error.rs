use thiserror::Error;

/// Boxed error produced by a backend driver, kept as the `source` of the
/// access-layer error that wraps it.
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum SqlAccessError {
    /// The store is unreachable, rejected the credentials, or no credentials are set.
    #[error("Connection error: {context}")]
    ConnectionError {
        context: String,
        #[source]
        source: Option<DriverError>,
    },

    /// Execute, fetch, commit or rollback failed.
    #[error("Query execution error: {context}")]
    QueryExecutionError {
        context: String,
        #[source]
        source: Option<DriverError>,
    },

    /// The zero-row probe was rejected or returned no columns.
    #[error("Schema probe error: {context}")]
    SchemaProbeError {
        context: String,
        #[source]
        source: Option<DriverError>,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),
}

impl SqlAccessError {
    #[must_use]
    pub fn connection(context: impl Into<String>, source: impl Into<DriverError>) -> Self {
        Self::ConnectionError {
            context: context.into(),
            source: Some(source.into()),
        }
    }

    #[must_use]
    pub fn execution(context: impl Into<String>, source: impl Into<DriverError>) -> Self {
        Self::QueryExecutionError {
            context: context.into(),
            source: Some(source.into()),
        }
    }

    #[must_use]
    pub fn probe(context: impl Into<String>, source: impl Into<DriverError>) -> Self {
        Self::SchemaProbeError {
            context: context.into(),
            source: Some(source.into()),
        }
    }

    /// Re-tag an execution failure as a probe failure. Connection failures and
    /// everything else pass through unchanged.
    #[must_use]
    pub fn into_probe_error(self) -> Self {
        match self {
            Self::QueryExecutionError { context, source } => {
                Self::SchemaProbeError { context, source }
            }
            other => other,
        }
    }

    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::ConnectionError { .. })
    }

    #[must_use]
    pub fn is_execution_error(&self) -> bool {
        matches!(self, Self::QueryExecutionError { .. })
    }

    #[must_use]
    pub fn is_probe_error(&self) -> bool {
        matches!(self, Self::SchemaProbeError { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn probe_retag_keeps_source() {
        let err = SqlAccessError::execution("prepare failed", "no such table: t");
        let retagged = err.into_probe_error();
        assert!(retagged.is_probe_error());
        assert_eq!(retagged.to_string(), "Schema probe error: prepare failed");
        assert_eq!(
            retagged.source().map(ToString::to_string).as_deref(),
            Some("no such table: t")
        );
    }

    #[test]
    fn connection_errors_are_not_retagged() {
        let err = SqlAccessError::connection("refused", "tcp reset").into_probe_error();
        assert!(err.is_connection_error());
    }
}
