//! Convenient imports for common functionality.

pub use crate::access::{ProbeMode, SqlQuery};
pub use crate::credentials::Credentials;
pub use crate::driver::{Connection, Cursor, Driver};
pub use crate::error::SqlAccessError;
pub use crate::results::{Row, Schema};
pub use crate::stream::RowStream;
pub use crate::types::RowValues;

#[cfg(feature = "postgres")]
pub use crate::postgres::{PostgresDriver, PostgresOptions};
#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteDriver, SqliteOptions};
