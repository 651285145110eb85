//! Database credentials and the process-wide credential store.
//!
//! Access objects built with [`SqlQuery::new`](crate::SqlQuery::new) read the store on
//! every connection attempt. Callers that prefer no global state pass a
//! [`Credentials`] value to [`SqlQuery::with_credentials`](crate::SqlQuery::with_credentials).

use std::fmt;
use std::sync::RwLock;

use lazy_static::lazy_static;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::SqlAccessError;

/// User, database and password for one store.
///
/// For `SQLite`, `database` is the database file path; `user` and `password` are not
/// used to open the file.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub user: String,
    pub database: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(
        user: impl Into<String>,
        database: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            database: database.into(),
            password: password.into(),
        }
    }

    /// True when all three fields are non-empty.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.user.is_empty() && !self.database.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("database", &self.database)
            .field("password", &"<redacted>")
            .finish()
    }
}

lazy_static! {
    static ref CREDENTIALS: RwLock<Option<Credentials>> = RwLock::new(None);
}

/// Store credentials process-wide if `user`, `database` and `password` are all
/// non-empty. Partial input leaves the store untouched and returns `false`.
pub fn configure(user: &str, database: &str, password: &str) -> bool {
    let credentials = Credentials::new(user, database, password);
    if !credentials.is_complete() {
        warn!(
            user_set = !user.is_empty(),
            database_set = !database.is_empty(),
            password_set = !password.is_empty(),
            "ignoring partial database credentials"
        );
        return false;
    }
    store(credentials);
    true
}

/// Overwrite the process-wide credentials unconditionally.
pub fn set_database_info(user: &str, database: &str, password: &str) {
    store(Credentials::new(user, database, password));
}

fn store(credentials: Credentials) {
    debug!(user = %credentials.user, database = %credentials.database, "database credentials configured");
    let mut guard = CREDENTIALS.write().unwrap_or_else(std::sync::PoisonError::into_inner);
    *guard = Some(credentials);
}

pub(crate) fn current() -> Option<Credentials> {
    CREDENTIALS
        .read()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .clone()
}

/// Where an access object gets its credentials from.
#[derive(Debug, Clone)]
pub(crate) enum CredentialSource {
    /// Read the process-wide store at each connection attempt.
    Global,
    Explicit(Credentials),
}

impl CredentialSource {
    pub(crate) fn resolve(&self) -> Result<Credentials, SqlAccessError> {
        match self {
            CredentialSource::Explicit(credentials) => Ok(credentials.clone()),
            CredentialSource::Global => current().ok_or_else(|| SqlAccessError::ConnectionError {
                context: "database credentials are not configured".to_string(),
                source: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The store is process-wide, so every assertion about it lives in this one test.
    #[test]
    fn global_store_lifecycle() {
        assert!(!configure("alice", "", "secret"));

        assert!(configure("alice", "corpus", "secret"));
        assert_eq!(current(), Some(Credentials::new("alice", "corpus", "secret")));

        assert!(!configure("", "", ""));
        assert_eq!(
            CredentialSource::Global.resolve().unwrap(),
            Credentials::new("alice", "corpus", "secret")
        );

        set_database_info("bob", "", "");
        assert_eq!(current(), Some(Credentials::new("bob", "", "")));

        assert!(configure("carol", "corpus", "pw"));
        assert_eq!(current().map(|c| c.user), Some("carol".to_string()));
    }

    #[test]
    fn debug_output_hides_password() {
        let rendered = format!("{:?}", Credentials::new("alice", "corpus", "hunter2"));
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn credentials_deserialize_from_json() {
        let parsed: Credentials = serde_json::from_str(
            r#"{"user": "alice", "database": "corpus", "password": "pw"}"#,
        )
        .unwrap();
        assert!(parsed.is_complete());
        assert_eq!(parsed.database, "corpus");
    }

    #[test]
    fn explicit_source_ignores_store() {
        let creds = Credentials::new("dave", "local.db", "x");
        let resolved = CredentialSource::Explicit(creds.clone()).resolve().unwrap();
        assert_eq!(resolved, creds);
    }
}
