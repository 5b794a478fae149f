//! `SQLite` infrastructure for the memory store.
//!
//! - [`connection`]: lock acquisition with poison recovery and pragma setup
//! - [`metrics`]: storage operation metrics
//! - [`store`]: the [`SqliteMemoryStore`] itself

mod connection;
mod metrics;
mod store;

pub use connection::{acquire_lock, configure_connection};
pub use metrics::record_operation_metrics;
pub use store::SqliteMemoryStore;
