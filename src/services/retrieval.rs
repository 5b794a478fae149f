//! Two-stage retrieval: coverage filter, then vector reranking.
//!
//! ```text
//! START ──► FILTERED ──► RERANKED ──► DONE
//!   │           │                      ▲
//!   │           └──────► DEGRADED ─────┤
//!   └──────────────────────────────────┘ (empty store)
//! ```
//!
//! The degraded path is not an error: when the embedder or index is missing,
//! a search fails, or no vector hit survives the coverage filter, the caller
//! still gets coverage-ordered memories with a score of `0.0`.

use super::{CoverageFilter, VectorReranker};
use crate::embedding::Embedder;
use crate::models::{
    DegradeReason, Memory, MemoryId, RetrievalOutcome, RetrievalPath, RetrievedMemory,
};
use crate::storage::MemoryStore;
use crate::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Whether the semantic stage can run, decided once at construction.
enum SemanticCapability {
    Ready(Arc<dyn Embedder>),
    Unavailable(DegradeReason),
}

/// Retrieval over a read-only memory store.
///
/// Holds shared read-only handles only, so one orchestrator can serve many
/// threads without locking.
pub struct RetrievalOrchestrator {
    store: Arc<dyn MemoryStore>,
    filter: CoverageFilter,
    reranker: VectorReranker,
    capability: SemanticCapability,
}

impl RetrievalOrchestrator {
    /// Creates an orchestrator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the embedder and the loaded index
    /// disagree on dimensionality.
    pub fn new(
        store: Arc<dyn MemoryStore>,
        reranker: VectorReranker,
        embedder: Option<Arc<dyn Embedder>>,
    ) -> Result<Self> {
        let capability = match (embedder, reranker.dimensions()) {
            (None, _) => SemanticCapability::Unavailable(DegradeReason::NoEmbedder),
            (Some(_), None) => SemanticCapability::Unavailable(DegradeReason::IndexUnavailable),
            (Some(embedder), Some(index_dims)) => {
                if embedder.dimensions() != index_dims {
                    return Err(Error::Configuration(format!(
                        "embedder produces {}-dimensional vectors but the index holds {index_dims}",
                        embedder.dimensions()
                    )));
                }
                SemanticCapability::Ready(embedder)
            },
        };

        if let SemanticCapability::Unavailable(reason) = &capability {
            tracing::warn!(
                reason = reason.as_str(),
                "Vector reranking disabled, retrieval will use coverage order"
            );
        }

        Ok(Self {
            store,
            filter: CoverageFilter::new(),
            reranker,
            capability,
        })
    }

    /// Returns true when queries will be reranked by the vector index.
    #[must_use]
    pub const fn semantic_enabled(&self) -> bool {
        matches!(self.capability, SemanticCapability::Ready(_))
    }

    /// Retrieves at most `final_limit` memories for `query`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the memory store cannot be read.
    pub fn retrieve(
        &self,
        query: &str,
        coverage_limit: usize,
        final_limit: usize,
    ) -> Result<Vec<RetrievedMemory>> {
        self.retrieve_detailed(query, coverage_limit, final_limit)
            .map(|outcome| outcome.memories)
    }

    /// Like [`retrieve`](Self::retrieve), but also reports the path taken.
    ///
    /// # Errors
    ///
    /// Returns an error only if the memory store cannot be read.
    #[instrument(
        name = "retrieval.retrieve",
        skip(self, query),
        fields(query_len = query.len(), coverage_limit, final_limit)
    )]
    pub fn retrieve_detailed(
        &self,
        query: &str,
        coverage_limit: usize,
        final_limit: usize,
    ) -> Result<RetrievalOutcome> {
        let start = Instant::now();
        let memories = self.store.list_all()?;

        let outcome = if memories.is_empty() {
            RetrievalOutcome {
                memories: Vec::new(),
                path: RetrievalPath::Empty,
                candidate_count: 0,
            }
        } else {
            let candidates = self.filter.filter(query, &memories, coverage_limit);
            let candidate_count = candidates.len();
            match self.rerank(query, &memories, &candidates, final_limit) {
                Ok(reranked) => RetrievalOutcome {
                    memories: reranked,
                    path: RetrievalPath::Reranked,
                    candidate_count,
                },
                Err(reason) => {
                    metrics::counter!("retrieval_degraded_total", "reason" => reason.as_str())
                        .increment(1);
                    RetrievalOutcome {
                        memories: coverage_order(&memories, &candidates, final_limit),
                        path: RetrievalPath::Degraded(reason),
                        candidate_count,
                    }
                },
            }
        };

        metrics::counter!("retrieval_requests_total", "path" => outcome.path.as_str())
            .increment(1);
        metrics::histogram!("retrieval_duration_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);
        tracing::debug!(
            path = outcome.path.as_str(),
            candidates = outcome.candidate_count,
            returned = outcome.memories.len(),
            "Retrieval complete"
        );

        Ok(outcome)
    }

    /// Runs the semantic stage, or says why it could not.
    fn rerank(
        &self,
        query: &str,
        memories: &[Memory],
        candidates: &[usize],
        final_limit: usize,
    ) -> std::result::Result<Vec<RetrievedMemory>, DegradeReason> {
        let embedder = match &self.capability {
            SemanticCapability::Ready(embedder) => embedder,
            SemanticCapability::Unavailable(reason) => return Err(reason.clone()),
        };

        let query_vector = embedder.embed(query).map_err(|e| {
            tracing::warn!(error = %e, "Query embedding failed");
            DegradeReason::SearchFailed(e.to_string())
        })?;

        // The whole index is searched so that every candidate can surface.
        let hits = self
            .reranker
            .search(&query_vector, self.reranker.len())
            .map_err(|e| {
                tracing::warn!(error = %e, "Vector search failed");
                DegradeReason::SearchFailed(e.to_string())
            })?;

        let by_id: HashMap<MemoryId, &Memory> = candidates
            .iter()
            .filter_map(|&i| memories.get(i))
            .map(|m| (m.id, m))
            .collect();

        let mut seen = HashSet::new();
        let reranked: Vec<RetrievedMemory> = hits
            .into_iter()
            .filter(|(id, _)| seen.insert(*id))
            .filter_map(|(id, distance)| {
                by_id.get(&id).map(|memory| RetrievedMemory {
                    id,
                    content: memory.content.clone(),
                    score: distance,
                })
            })
            .take(final_limit)
            .collect();

        if reranked.is_empty() {
            return Err(DegradeReason::NoSurvivors);
        }
        Ok(reranked)
    }
}

fn coverage_order(
    memories: &[Memory],
    candidates: &[usize],
    final_limit: usize,
) -> Vec<RetrievedMemory> {
    candidates
        .iter()
        .filter_map(|&i| memories.get(i))
        .take(final_limit)
        .map(RetrievedMemory::unscored)
        .collect()
}
