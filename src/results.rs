//! Row and schema types handed to downstream consumers.

pub mod row;
pub mod schema;

pub use row::Row;
pub use schema::Schema;
