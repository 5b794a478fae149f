//! Memory types and identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique, stable identifier for a memory.
///
/// Matches the integer primary key of the `memories` table and the values
/// stored in the vector index id-map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryId(i64);

impl MemoryId {
    /// Creates a new memory ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw integer value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for MemoryId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A stored conversation snippet.
///
/// Owned by the memory store; retrieval only ever reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    /// Unique identifier.
    pub id: MemoryId,
    /// The memory content.
    pub content: String,
}

impl Memory {
    /// Creates a new memory.
    #[must_use]
    pub fn new(id: impl Into<MemoryId>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }
}
