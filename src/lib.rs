//! Blocking SQL access layer with per-call sessions.
//!
//! Every operation on a [`SqlQuery`] opens its own connection and cursor, runs, and
//! releases them cursor-first. Reads can be streamed lazily through a [`RowStream`]
//! that keeps its connection only until it is exhausted or dropped, or materialized
//! together with a [`Schema`] discovered by a zero-row probe of the same statement.
//!
//! Backends sit behind the [`driver`] traits: [`PostgresDriver`] (feature `postgres`)
//! and [`SqliteDriver`] (feature `sqlite`).

pub mod access;
pub mod credentials;
pub mod driver;
pub mod error;
pub mod prelude;
pub mod probe;
pub mod results;
pub mod session;
pub mod stream;
pub mod types;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "test-utils-postgres")]
pub mod test_utils;

pub use access::{ProbeMode, SqlQuery};
pub use credentials::{Credentials, configure, set_database_info};
pub use error::{DriverError, SqlAccessError};
pub use probe::probe_statement;
pub use results::{Row, Schema};
pub use session::{Session, with_session};
pub use stream::RowStream;
pub use types::RowValues;

#[cfg(feature = "postgres")]
pub use postgres::{PostgresDriver, PostgresOptions};
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteDriver, SqliteOptions};
