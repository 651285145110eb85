// PostgreSQL backend - tokio-postgres connections opened per session
//
// - config: host/port/timeouts and conversion into a tokio_postgres::Config
// - params: binding RowValues as Postgres parameters
// - query: row decoding
// - driver: the Driver/Connection/Cursor implementation

mod config;
mod driver;
pub mod params;
pub mod query;

pub use config::{PostgresOptions, PostgresOptionsBuilder};
pub use driver::PostgresDriver;
