//! usearch HNSW vector index.
//!
//! Loads a prebuilt usearch index file whose keys are the vector positions
//! (0..n), so hits map through the same id-map as the flat index. Only
//! available with the `usearch-hnsw` feature.

use crate::storage::traits::VectorIndex;
use crate::{Error, Result};
use std::path::Path;
use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

/// HNSW connectivity parameter (M).
const HNSW_CONNECTIVITY: usize = 16;

/// HNSW expansion factor for construction (`ef_construction`).
const HNSW_EXPANSION_ADD: usize = 128;

/// HNSW expansion factor for search (`ef`).
const HNSW_EXPANSION_SEARCH: usize = 64;

/// Read-only HNSW index backed by the native usearch library.
pub struct UsearchIndex {
    dimensions: usize,
    index: Index,
}

impl UsearchIndex {
    fn options(dimensions: usize) -> IndexOptions {
        IndexOptions {
            dimensions,
            metric: MetricKind::L2sq,
            quantization: ScalarKind::F32,
            connectivity: HNSW_CONNECTIVITY,
            expansion_add: HNSW_EXPANSION_ADD,
            expansion_search: HNSW_EXPANSION_SEARCH,
            multi: false,
        }
    }

    /// Loads an index file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the index cannot be created or the
    /// file cannot be loaded, and [`Error::Configuration`] if the stored
    /// dimensionality differs from `dimensions`.
    pub fn load(path: impl AsRef<Path>, dimensions: usize) -> Result<Self> {
        let path = path.as_ref();
        let index = Index::new(&Self::options(dimensions)).map_err(|e| Error::OperationFailed {
            operation: "create_usearch_index".to_string(),
            cause: e.to_string(),
        })?;

        index
            .load(path.to_string_lossy().as_ref())
            .map_err(|e| Error::OperationFailed {
                operation: "load_usearch_index".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;

        if index.dimensions() != dimensions {
            return Err(Error::Configuration(format!(
                "{} holds {}-dimensional vectors but embedding_dimensions is {dimensions}",
                path.display(),
                index.dimensions()
            )));
        }

        Ok(Self { dimensions, index })
    }

    /// Builds an in-memory index from vectors, keyed by position.
    ///
    /// # Errors
    ///
    /// Returns an error if any vector has the wrong dimensionality or the
    /// native index rejects it.
    pub fn from_vectors(dimensions: usize, vectors: &[Vec<f32>]) -> Result<Self> {
        let index = Index::new(&Self::options(dimensions)).map_err(|e| Error::OperationFailed {
            operation: "create_usearch_index".to_string(),
            cause: e.to_string(),
        })?;
        index
            .reserve(vectors.len().max(1))
            .map_err(|e| Error::OperationFailed {
                operation: "reserve_usearch_capacity".to_string(),
                cause: e.to_string(),
            })?;

        for (position, vector) in vectors.iter().enumerate() {
            if vector.len() != dimensions {
                return Err(Error::InvalidInput(format!(
                    "vector at position {position} has {} dimensions, expected {dimensions}",
                    vector.len()
                )));
            }
            index
                .add(position as u64, vector)
                .map_err(|e| Error::OperationFailed {
                    operation: "usearch_add".to_string(),
                    cause: e.to_string(),
                })?;
        }

        Ok(Self { dimensions, index })
    }

    /// Persists the index file.
    ///
    /// # Errors
    ///
    /// Returns an error if the native save fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.index
            .save(path.to_string_lossy().as_ref())
            .map_err(|e| Error::OperationFailed {
                operation: "save_usearch_index".to_string(),
                cause: format!("{}: {e}", path.display()),
            })
    }
}

impl VectorIndex for UsearchIndex {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn len(&self) -> usize {
        self.index.size()
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dimensions {
            return Err(Error::InvalidInput(format!(
                "Query dimension mismatch: expected {}, got {}",
                self.dimensions,
                query.len()
            )));
        }
        if self.index.size() == 0 || k == 0 {
            return Ok(Vec::new());
        }

        let matches = self
            .index
            .search(query, k)
            .map_err(|e| Error::OperationFailed {
                operation: "usearch_search".to_string(),
                cause: e.to_string(),
            })?;

        let hits = matches
            .keys
            .iter()
            .zip(matches.distances.iter())
            .filter_map(|(&key, &distance)| usize::try_from(key).ok().map(|p| (p, distance)))
            .collect();
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vectors_and_search() {
        let index = UsearchIndex::from_vectors(
            2,
            &[vec![0.0, 0.0], vec![5.0, 5.0], vec![1.0, 0.0]],
        )
        .expect("build");
        assert_eq!(index.len(), 3);

        let hits = index.search(&[1.0, 0.0], 2).expect("search");
        assert_eq!(hits.first().map(|(p, _)| *p), Some(2));
    }

    #[test]
    fn test_search_rejects_wrong_dimensions() {
        let index = UsearchIndex::from_vectors(2, &[vec![0.0, 0.0]]).expect("build");
        assert!(index.search(&[0.0], 1).is_err());
    }
}
