//! Persistence layer: libSQL-backed storage for enriched photo records.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{PhotoRecord, PhotoStore};
