//! Dense vector reranking over a prebuilt index.

use crate::models::MemoryId;
use crate::storage::{VectorIndex, load_id_map, open_vector_index};
use crate::{Error, Result};
use std::path::Path;

/// Nearest-neighbor search that answers in memory ids.
///
/// Wraps a [`VectorIndex`] and the id-map translating index positions into
/// memory ids. A reranker whose artifacts failed to load is *unavailable*:
/// [`is_available`](Self::is_available) is false and [`search`](Self::search)
/// returns an error instead of panicking.
pub struct VectorReranker {
    state: RerankerState,
}

enum RerankerState {
    Ready {
        index: Box<dyn VectorIndex>,
        id_map: Vec<MemoryId>,
    },
    Unavailable {
        reason: String,
    },
}

impl VectorReranker {
    /// Wraps a loaded index and id-map.
    ///
    /// An id-map whose length differs from the index size leaves the
    /// reranker unavailable.
    #[must_use]
    pub fn new(index: Box<dyn VectorIndex>, id_map: Vec<MemoryId>) -> Self {
        if id_map.len() != index.len() {
            let reason = format!(
                "id-map has {} entries but index holds {} vectors",
                id_map.len(),
                index.len()
            );
            tracing::warn!(%reason, "Vector index disabled");
            return Self::unavailable(reason);
        }
        Self {
            state: RerankerState::Ready { index, id_map },
        }
    }

    /// Creates a reranker that never searches.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            state: RerankerState::Unavailable {
                reason: reason.into(),
            },
        }
    }

    /// Loads the index and id-map artifacts.
    ///
    /// A missing or unreadable artifact leaves the reranker unavailable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the artifacts load but cannot serve
    /// this deployment, such as an index whose dimensionality differs from
    /// `dimensions`.
    pub fn load(index_path: &Path, idmap_path: &Path, dimensions: usize) -> Result<Self> {
        match Self::try_load(index_path, idmap_path, dimensions) {
            Ok(reranker) => Ok(reranker),
            Err(e @ Error::Configuration(_)) => Err(e),
            Err(e) => {
                tracing::warn!(
                    index = %index_path.display(),
                    error = %e,
                    "Could not load vector index, retrieval will use coverage order"
                );
                metrics::counter!("vector_index_load_failures_total").increment(1);
                Ok(Self::unavailable(e.to_string()))
            },
        }
    }

    /// Loads the index and id-map artifacts, failing on any problem.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if either artifact cannot be loaded or
    /// they disagree on size.
    pub fn load_required(index_path: &Path, idmap_path: &Path, dimensions: usize) -> Result<Self> {
        let reranker = Self::try_load(index_path, idmap_path, dimensions).map_err(|e| match e {
            Error::Configuration(_) => e,
            other => Error::Configuration(format!("vector index required: {other}")),
        })?;
        match &reranker.state {
            RerankerState::Ready { .. } => Ok(reranker),
            RerankerState::Unavailable { reason } => {
                Err(Error::Configuration(format!("vector index required: {reason}")))
            },
        }
    }

    fn try_load(index_path: &Path, idmap_path: &Path, dimensions: usize) -> Result<Self> {
        let index = open_vector_index(index_path, dimensions)?;
        let id_map = load_id_map(idmap_path)?;
        tracing::info!(
            vectors = index.len(),
            dimensions = index.dimensions(),
            "Loaded vector index"
        );
        Ok(Self::new(index, id_map))
    }

    /// Returns true when the index is loaded and searchable.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self.state, RerankerState::Ready { .. })
    }

    /// Why the reranker is unavailable, if it is.
    #[must_use]
    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.state {
            RerankerState::Ready { .. } => None,
            RerankerState::Unavailable { reason } => Some(reason),
        }
    }

    /// Dimensionality of the loaded index.
    #[must_use]
    pub fn dimensions(&self) -> Option<usize> {
        match &self.state {
            RerankerState::Ready { index, .. } => Some(index.dimensions()),
            RerankerState::Unavailable { .. } => None,
        }
    }

    /// Number of indexed vectors (0 when unavailable).
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.state {
            RerankerState::Ready { index, .. } => index.len(),
            RerankerState::Unavailable { .. } => 0,
        }
    }

    /// Returns true when there is nothing to search.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns up to `min(k, index size)` `(memory id, distance)` pairs in
    /// ascending distance order.
    ///
    /// # Errors
    ///
    /// Returns an error if the reranker is unavailable or the index rejects
    /// the query.
    pub fn search(&self, query_vector: &[f32], k: usize) -> Result<Vec<(MemoryId, f32)>> {
        let RerankerState::Ready { index, id_map } = &self.state else {
            return Err(Error::OperationFailed {
                operation: "vector_search".to_string(),
                cause: "vector index unavailable".to_string(),
            });
        };

        let k = k.min(index.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        let hits = index.search(query_vector, k)?;
        Ok(hits
            .into_iter()
            .filter_map(|(position, distance)| {
                let id = id_map.get(position).copied();
                if id.is_none() {
                    tracing::warn!(position, "Index returned a position outside the id-map");
                }
                id.map(|id| (id, distance))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FlatIndex;
    use tempfile::TempDir;

    fn reranker() -> VectorReranker {
        let index = FlatIndex::new(2, vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![5.0, 5.0]])
            .expect("index");
        VectorReranker::new(
            Box::new(index),
            vec![MemoryId::new(10), MemoryId::new(20), MemoryId::new(30)],
        )
    }

    #[test]
    fn test_search_maps_positions_to_ids() {
        let hits = reranker().search(&[0.9, 0.0], 2).expect("search");
        let ids: Vec<i64> = hits.iter().map(|(id, _)| id.get()).collect();
        assert_eq!(ids, vec![20, 10]);
    }

    #[test]
    fn test_k_is_clamped_to_index_size() {
        let hits = reranker().search(&[0.0, 0.0], 100).expect("search");
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn test_unavailable_search_errors() {
        let reranker = VectorReranker::unavailable("no index");
        assert!(!reranker.is_available());
        assert_eq!(reranker.unavailable_reason(), Some("no index"));
        assert_eq!(reranker.dimensions(), None);
        assert!(reranker.search(&[0.0, 0.0], 1).is_err());
    }

    #[test]
    fn test_id_map_length_mismatch_is_unavailable() {
        let index = FlatIndex::new(2, vec![vec![0.0, 0.0]]).expect("index");
        let reranker = VectorReranker::new(Box::new(index), Vec::new());
        assert!(!reranker.is_available());
    }

    #[test]
    fn test_load_missing_artifacts_degrades() {
        let dir = TempDir::new().expect("tempdir");
        let reranker = VectorReranker::load(
            &dir.path().join("missing.json"),
            &dir.path().join("missing_ids.json"),
            2,
        )
        .expect("missing artifacts degrade");
        assert!(!reranker.is_available());
    }

    #[test]
    fn test_load_dimension_mismatch_is_configuration_error() {
        let dir = TempDir::new().expect("tempdir");
        let index_path = dir.path().join("index.json");
        let idmap_path = dir.path().join("idmap.json");
        FlatIndex::new(3, vec![vec![0.0, 1.0, 2.0]])
            .expect("index")
            .save(&index_path)
            .expect("save");
        std::fs::write(&idmap_path, "[1]").expect("write");

        assert!(matches!(
            VectorReranker::load(&index_path, &idmap_path, 1024),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            VectorReranker::load_required(&index_path, &idmap_path, 1024),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_load_required_missing_is_configuration_error() {
        let dir = TempDir::new().expect("tempdir");
        let result = VectorReranker::load_required(
            &dir.path().join("missing.json"),
            &dir.path().join("missing_ids.json"),
            2,
        );
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_load_from_artifacts() {
        let dir = TempDir::new().expect("tempdir");
        let index_path = dir.path().join("index.json");
        let idmap_path = dir.path().join("idmap.json");
        FlatIndex::new(2, vec![vec![0.0, 1.0], vec![1.0, 0.0]])
            .expect("index")
            .save(&index_path)
            .expect("save");
        std::fs::write(&idmap_path, "[5, 6]").expect("write");

        let reranker = VectorReranker::load(&index_path, &idmap_path, 2).expect("load");
        assert!(reranker.is_available());
        assert_eq!(reranker.dimensions(), Some(2));
        assert_eq!(reranker.len(), 2);
    }
}
