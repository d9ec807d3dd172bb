//! Status store — one append-only row per received submission.

pub mod libsql_backend;
pub mod traits;

pub use libsql_backend::LibSqlStatusStore;
pub use traits::{STATUS_RECEIVED, StatusRecord, StatusStore};
