//! Retrieval result types.

use super::{Memory, MemoryId};
use serde::{Deserialize, Serialize};

/// A memory scored by the coverage filter.
///
/// `index` points into the memory slice the filter was given.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredCandidate {
    /// Position of the memory in the filtered input.
    pub index: usize,
    /// Fraction of query tokens present in the memory (0.0 to 1.0).
    pub coverage: f32,
    /// Number of shared tokens.
    pub overlap_count: usize,
}

/// A memory returned by the retrieval orchestrator.
///
/// `score` carries the vector index distance on the reranked path and `0.0`
/// on the degraded (coverage-only) path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedMemory {
    /// Memory identifier.
    pub id: MemoryId,
    /// Memory content.
    pub content: String,
    /// Distance reported by the vector index, or `0.0` for coverage-only results.
    pub score: f32,
}

impl RetrievedMemory {
    /// Builds an unscored result from a memory (coverage path).
    #[must_use]
    pub fn unscored(memory: &Memory) -> Self {
        Self {
            id: memory.id,
            content: memory.content.clone(),
            score: 0.0,
        }
    }
}

/// Which path a retrieval call finished on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalPath {
    /// The memory store was empty; nothing ran past the start state.
    Empty,
    /// Vector reranking produced the results.
    Reranked,
    /// Coverage order was used because the semantic stage could not deliver.
    Degraded(DegradeReason),
}

impl RetrievalPath {
    /// Returns the path as a metrics label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Reranked => "reranked",
            Self::Degraded(_) => "degraded",
        }
    }
}

/// Why retrieval fell back to coverage order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradeReason {
    /// No embedder was configured.
    NoEmbedder,
    /// The vector index failed to load.
    IndexUnavailable,
    /// Embedding or index search returned an error.
    SearchFailed(String),
    /// None of the vector hits were among the coverage candidates.
    NoSurvivors,
}

impl DegradeReason {
    /// Returns the reason as a metrics label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoEmbedder => "no_embedder",
            Self::IndexUnavailable => "index_unavailable",
            Self::SearchFailed(_) => "search_failed",
            Self::NoSurvivors => "no_survivors",
        }
    }
}

/// Full outcome of one retrieval call.
#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    /// Final ranked memories.
    pub memories: Vec<RetrievedMemory>,
    /// Path taken.
    pub path: RetrievalPath,
    /// Number of candidates the coverage filter produced.
    pub candidate_count: usize,
}
