//! Shared connection handling for the `SQLite` memory store.

use crate::Result;
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};

/// Helper to acquire mutex lock with poison recovery.
///
/// If the mutex is poisoned (due to a panic in a previous critical section),
/// we recover the inner value and log a warning. The store is read-only, so
/// a panicking reader cannot leave the connection half-written.
pub fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("SQLite mutex was poisoned, recovering");
            metrics::counter!("sqlite_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}

/// Configures a `SQLite` connection.
///
/// Sets a 5-second `busy_timeout` so reads wait out a concurrent writer
/// (e.g. the ingestion job) instead of failing with `SQLITE_BUSY`.
///
/// # Errors
///
/// Never fails today; pragma failures are ignored because read-only
/// connections reject some pragmas.
pub fn configure_connection(conn: &Connection) -> Result<()> {
    let _ = conn.pragma_update(None, "busy_timeout", "5000");
    Ok(())
}
