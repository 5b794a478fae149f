//! `SQLite`-backed memory store.
//!
//! The store reads the `memories(id INTEGER PRIMARY KEY, content TEXT)` table
//! produced by the ingestion job. Retrieval opens it read-only.

use super::{acquire_lock, configure_connection, record_operation_metrics};
use crate::models::{Memory, MemoryId};
use crate::storage::traits::MemoryStore;
use crate::{Error, Result};
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;
use tracing::instrument;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS memories (
    id INTEGER PRIMARY KEY,
    content TEXT NOT NULL
)";

/// `SQLite` memory store.
///
/// # Concurrency Model
///
/// Uses a `Mutex<Connection>` because `rusqlite::Connection` is not `Sync`.
/// All access is read-only once opened, so the lock only serializes reads.
pub struct SqliteMemoryStore {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl SqliteMemoryStore {
    /// Opens an existing database read-only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the file cannot be opened or has
    /// no `memories` table.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            Error::Configuration(format!(
                "cannot open memory database {}: {e}",
                db_path.display()
            ))
        })?;
        configure_connection(&conn)?;

        conn.query_row("SELECT COUNT(*) FROM memories", [], |row| {
            row.get::<_, i64>(0)
        })
        .map_err(|e| {
            Error::Configuration(format!(
                "memory database {} is not usable: {e}",
                db_path.display()
            ))
        })?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path.to_path_buf()),
        })
    }

    /// Creates (or opens) a writable database and ensures the schema exists.
    ///
    /// Used by ingestion tooling and test fixtures.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn create(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        let conn = Connection::open(&db_path).map_err(|e| Error::operation("open_sqlite", e))?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path),
        };
        store.initialize()?;
        Ok(store)
    }

    /// Creates an in-memory store (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::operation("open_sqlite_in_memory", e))?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path: None,
        };
        store.initialize()?;
        Ok(store)
    }

    /// Returns the database path (None for in-memory).
    #[must_use]
    pub const fn db_path(&self) -> Option<&PathBuf> {
        self.db_path.as_ref()
    }

    fn initialize(&self) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        configure_connection(&conn)?;
        conn.execute(SCHEMA, [])
            .map_err(|e| Error::operation("create_memories_table", e))?;
        Ok(())
    }

    /// Inserts or replaces a memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails (including on read-only handles).
    pub fn insert(&self, memory: &Memory) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        conn.execute(
            "INSERT OR REPLACE INTO memories (id, content) VALUES (?1, ?2)",
            params![memory.id.get(), memory.content],
        )
        .map_err(|e| Error::operation("insert_memory", e))?;
        Ok(())
    }
}

impl MemoryStore for SqliteMemoryStore {
    #[instrument(skip(self), fields(operation = "get", backend = "sqlite", memory.id = %id))]
    fn get(&self, id: MemoryId) -> Result<Option<Memory>> {
        let start = Instant::now();
        let result = (|| {
            let conn = acquire_lock(&self.conn);
            conn.query_row(
                "SELECT id, content FROM memories WHERE id = ?1",
                params![id.get()],
                |row| Ok(Memory::new(row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()
            .map_err(|e| Error::operation("get_memory", e))
        })();

        let status = if result.is_ok() { "success" } else { "error" };
        record_operation_metrics("sqlite", "get", start, status);
        result
    }

    #[instrument(skip(self), fields(operation = "list_all", backend = "sqlite"))]
    fn list_all(&self) -> Result<Vec<Memory>> {
        let start = Instant::now();
        let result = (|| {
            let conn = acquire_lock(&self.conn);
            let mut stmt = conn
                .prepare("SELECT id, content FROM memories ORDER BY rowid")
                .map_err(|e| Error::operation("prepare_list_all", e))?;

            let memories = stmt
                .query_map([], |row| {
                    Ok(Memory::new(row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
                })
                .map_err(|e| Error::operation("list_all", e))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| Error::operation("read_memory_row", e))?;

            Ok(memories)
        })();

        let status = if result.is_ok() { "success" } else { "error" };
        record_operation_metrics("sqlite", "list_all", start, status);
        result
    }

    fn count(&self) -> Result<usize> {
        let conn = acquire_lock(&self.conn);
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM memories", [], |row| row.get(0))
            .map_err(|e| Error::operation("count_memories", e))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}
