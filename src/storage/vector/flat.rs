//! Exact brute-force vector index.
//!
//! Vectors are persisted as JSON `{"dimensions": D, "vectors": [[f32; D], ...]}`
//! and searched with squared L2 distance, the same metric a flat L2 index
//! reports. O(n) per query, which is fine for per-conversation memory sets.

use crate::storage::traits::VectorIndex;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// On-disk layout of a flat index.
#[derive(Debug, Serialize, Deserialize)]
struct FlatIndexData {
    dimensions: usize,
    vectors: Vec<Vec<f32>>,
}

/// Exact L2 index over a fixed set of vectors addressed by position.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimensions: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    /// Builds an index from in-memory vectors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `dimensions` is zero or any vector
    /// has a different length.
    pub fn new(dimensions: usize, vectors: Vec<Vec<f32>>) -> Result<Self> {
        if dimensions == 0 {
            return Err(Error::InvalidInput(
                "index dimensions must be greater than zero".to_string(),
            ));
        }
        if let Some((position, bad)) = vectors
            .iter()
            .enumerate()
            .find(|(_, v)| v.len() != dimensions)
        {
            return Err(Error::InvalidInput(format!(
                "vector at position {position} has {} dimensions, expected {dimensions}",
                bad.len()
            )));
        }
        Ok(Self {
            dimensions,
            vectors,
        })
    }

    /// Loads an index from its JSON artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// contains vectors of inconsistent dimensionality.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "load_index".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        let data: FlatIndexData =
            serde_json::from_str(&content).map_err(|e| Error::OperationFailed {
                operation: "parse_index".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;

        Self::new(data.dimensions, data.vectors)
    }

    /// Writes the index artifact atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = FlatIndexData {
            dimensions: self.dimensions,
            vectors: self.vectors.clone(),
        };
        crate::io::write_json_atomic(path.as_ref(), &data)
    }

    fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| {
                let d = x - y;
                d * d
            })
            .sum()
    }
}

impl VectorIndex for FlatIndex {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dimensions {
            return Err(Error::InvalidInput(format!(
                "Query dimension mismatch: expected {}, got {}",
                self.dimensions,
                query.len()
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, v)| (position, Self::squared_l2(query, v)))
            .collect();

        // Stable: equal distances keep position order.
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);
        Ok(scored)
    }
}
