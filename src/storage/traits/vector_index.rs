//! Vector index trait.
//!
//! Abstracts a prebuilt nearest-neighbor index addressed by position. The
//! mapping from positions to memory ids lives outside the index (see
//! [`VectorReranker`](crate::services::VectorReranker)).
//!
//! # Available Implementations
//!
//! | Index | Use Case | Configuration |
//! |-------|----------|---------------|
//! | `FlatIndex` | Exact L2 search, JSON artifact | Default, no native deps |
//! | `UsearchIndex` | HNSW index file | `usearch-hnsw` feature |

use crate::Result;

/// Trait for prebuilt vector indexes.
///
/// Implementations are loaded once and only read afterwards, so `search`
/// takes `&self` and needs no interior mutability.
pub trait VectorIndex: Send + Sync {
    /// The dimensionality of indexed vectors.
    fn dimensions(&self) -> usize;

    /// Number of indexed vectors.
    fn len(&self) -> usize;

    /// Returns true when the index holds no vectors.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Searches for the `k` nearest vectors.
    ///
    /// Returns `(position, distance)` pairs ordered by ascending distance.
    /// Callers must not pass `k` larger than [`len`](VectorIndex::len).
    ///
    /// # Errors
    ///
    /// Returns an error if the query has the wrong dimensionality or the
    /// index rejects the search.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>>;
}
