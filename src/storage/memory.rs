//! In-memory memory store for tests and small fixtures.

use crate::Result;
use crate::models::{Memory, MemoryId};
use crate::storage::traits::MemoryStore;

/// A memory store backed by a `Vec`, preserving insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    memories: Vec<Memory>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            memories: Vec::new(),
        }
    }

    /// Creates a store holding `memories` in the given order.
    #[must_use]
    pub const fn with_memories(memories: Vec<Memory>) -> Self {
        Self { memories }
    }
}

impl FromIterator<Memory> for InMemoryStore {
    fn from_iter<I: IntoIterator<Item = Memory>>(iter: I) -> Self {
        Self::with_memories(iter.into_iter().collect())
    }
}

impl MemoryStore for InMemoryStore {
    fn get(&self, id: MemoryId) -> Result<Option<Memory>> {
        Ok(self.memories.iter().find(|m| m.id == id).cloned())
    }

    fn list_all(&self) -> Result<Vec<Memory>> {
        Ok(self.memories.clone())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.memories.len())
    }
}
