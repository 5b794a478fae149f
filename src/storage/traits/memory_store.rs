//! Memory store trait.

use crate::Result;
use crate::models::{Memory, MemoryId};

/// Read-only access to the authoritative memory store.
///
/// Retrieval never writes through this trait. Implementations must return
/// memories from [`list_all`](MemoryStore::list_all) in a stable order, since
/// the coverage filter breaks ties by position.
pub trait MemoryStore: Send + Sync {
    /// Retrieves a memory by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be queried.
    fn get(&self, id: MemoryId) -> Result<Option<Memory>>;

    /// Lists every memory in stable storage order.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be queried.
    fn list_all(&self) -> Result<Vec<Memory>>;

    /// Returns the total count of memories.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be queried.
    fn count(&self) -> Result<usize> {
        Ok(self.list_all()?.len())
    }
}
