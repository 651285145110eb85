// SQLite backend - rusqlite connections opened per session
//
// - config: connection options and their builder
// - params: parameter conversion from RowValues to rusqlite values
// - query: row decoding
// - worker: the thread that owns each rusqlite connection and steps statements lazily
// - driver: the Driver/Connection/Cursor implementation

mod config;
mod driver;
pub mod params;
pub mod query;
mod worker;

pub use config::{SqliteOptions, SqliteOptionsBuilder};
pub use driver::SqliteDriver;
