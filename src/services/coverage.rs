//! Keyword coverage filter.
//!
//! The first, coarse retrieval stage. Each memory is scored by how many of the
//! query's distinct words it contains, relative to the number of distinct
//! query words. Scoring is pure and deterministic: ties keep storage order.

use crate::models::{Memory, ScoredCandidate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Runs of Unicode word characters.
static WORD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\w+").unwrap_or_else(|_| unreachable!()));

/// Lowercases `text` and returns its distinct word tokens.
#[must_use]
pub fn tokenize(text: &str) -> HashSet<String> {
    let lowered = text.to_lowercase();
    WORD_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Scores memories by query keyword coverage.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoverageFilter;

impl CoverageFilter {
    /// Creates a new coverage filter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Scores every memory against the query, in storage order.
    ///
    /// Returns an empty vector when the query has no tokens, since coverage
    /// is undefined there.
    #[must_use]
    pub fn score(&self, query: &str, memories: &[Memory]) -> Vec<ScoredCandidate> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return Vec::new();
        }

        #[allow(clippy::cast_precision_loss)]
        let query_len = query_tokens.len() as f32;

        memories
            .iter()
            .enumerate()
            .map(|(index, memory)| {
                let memory_tokens = tokenize(&memory.content);
                let overlap_count = query_tokens.intersection(&memory_tokens).count();
                #[allow(clippy::cast_precision_loss)]
                let coverage = overlap_count as f32 / query_len;
                ScoredCandidate {
                    index,
                    coverage,
                    overlap_count,
                }
            })
            .collect()
    }

    /// Returns the ranked candidates, at most `limit` of them.
    ///
    /// A query without tokens yields the first `min(limit, N)` memories with
    /// zero coverage.
    #[must_use]
    pub fn rank(&self, query: &str, memories: &[Memory], limit: usize) -> Vec<ScoredCandidate> {
        if tokenize(query).is_empty() {
            return (0..limit.min(memories.len()))
                .map(|index| ScoredCandidate {
                    index,
                    coverage: 0.0,
                    overlap_count: 0,
                })
                .collect();
        }

        let mut scored = self.score(query, memories);
        // `sort_by` is stable, so equal coverage keeps storage order.
        scored.sort_by(|a, b| b.coverage.total_cmp(&a.coverage));
        scored.truncate(limit);
        scored
    }

    /// Returns indices into `memories` ranked by coverage, at most `limit`.
    #[must_use]
    pub fn filter(&self, query: &str, memories: &[Memory], limit: usize) -> Vec<usize> {
        self.rank(query, memories, limit)
            .into_iter()
            .map(|c| c.index)
            .collect()
    }
}
