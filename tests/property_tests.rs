//! Property-based tests for retrieval and evaluation invariants.
//!
//! Uses proptest to verify invariants across random inputs:
//! - Coverage ranking is bounded, ordered and stable
//! - Flat index search returns nearest-first distances
//! - Aggregated accuracy is consistent with per-category counts
//! - Prompt construction never expands placeholders inside answers
//! - Retrieval returns only stored memories, within `final_limit`

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use vacmem::llm::RetryPolicy;
use vacmem::models::{
    CategoryId, JudgeLabel, JudgeOutcome, JudgeVerdict, Memory, MemoryId, QuestionRecord,
    RetrievalPath,
};
use vacmem::services::{build_prompt, parse_verdict, tokenize};
use vacmem::storage::{FlatIndex, InMemoryStore};
use vacmem::{
    CoverageFilter, Embedder, EvaluationAggregator, RetrievalOrchestrator, VectorIndex,
    VectorReranker,
};

/// Embeds text as its length and vowel count.
struct ShapeEmbedder;

impl Embedder for ShapeEmbedder {
    fn dimensions(&self) -> usize {
        2
    }

    #[allow(clippy::cast_precision_loss)]
    fn embed(&self, text: &str) -> vacmem::Result<Vec<f32>> {
        let vowels = text.chars().filter(|c| "aeiou".contains(*c)).count();
        Ok(vec![text.len() as f32, vowels as f32])
    }
}

fn memories(contents: &[String]) -> Vec<Memory> {
    contents
        .iter()
        .zip(1_i64..)
        .map(|(content, id)| Memory::new(id, content.as_str()))
        .collect()
}

fn outcome(category: i64, correct: Option<bool>) -> JudgeOutcome {
    let record = QuestionRecord {
        question: "q".to_string(),
        ground_truth: "g".to_string(),
        generated_answer: "a".to_string(),
        category: CategoryId(category),
    };
    match correct {
        Some(true) => JudgeOutcome::Judged {
            record,
            verdict: JudgeVerdict::new(JudgeLabel::Correct, "ok"),
        },
        Some(false) => JudgeOutcome::Judged {
            record,
            verdict: JudgeVerdict::new(JudgeLabel::Wrong, "no"),
        },
        None => JudgeOutcome::Failed {
            record,
            error: "timeout".to_string(),
        },
    }
}

proptest! {
    /// Property: tokenizing is idempotent over the joined token set.
    #[test]
    fn prop_tokenize_is_lowercase_and_stable(text in "[a-zA-Z0-9 ,.?!]{0,80}") {
        let tokens = tokenize(&text);
        prop_assert!(tokens.iter().all(|t| t.to_lowercase() == *t));
        let joined = tokens.iter().cloned().collect::<Vec<_>>().join(" ");
        prop_assert_eq!(tokenize(&joined), tokens);
    }

    /// Property: ranking returns at most `min(limit, n)` distinct, valid
    /// indices in non-increasing coverage order.
    #[test]
    fn prop_coverage_rank_is_bounded_and_ordered(
        query in "[a-e ]{0,20}",
        contents in prop::collection::vec("[a-e ]{0,20}", 0..30),
        limit in 0usize..40,
    ) {
        let memories = memories(&contents);
        let ranked = CoverageFilter::new().rank(&query, &memories, limit);

        prop_assert!(ranked.len() <= limit.min(memories.len()));
        let unique: HashSet<_> = ranked.iter().map(|c| c.index).collect();
        prop_assert_eq!(unique.len(), ranked.len());
        prop_assert!(ranked.iter().all(|c| c.index < memories.len()));
        prop_assert!(ranked.iter().all(|c| (0.0..=1.0).contains(&c.coverage)));
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].coverage >= pair[1].coverage);
            if (pair[0].coverage - pair[1].coverage).abs() < f32::EPSILON {
                prop_assert!(pair[0].index < pair[1].index);
            }
        }
    }

    /// Property: flat index hits are sorted by ascending squared distance.
    #[test]
    fn prop_flat_index_nearest_first(
        vectors in prop::collection::vec(prop::collection::vec(-10.0f32..10.0, 4), 1..40),
        query in prop::collection::vec(-10.0f32..10.0, 4),
        k in 0usize..50,
    ) {
        let count = vectors.len();
        let index = FlatIndex::new(4, vectors).expect("index");
        let hits = index.search(&query, k).expect("search");

        prop_assert_eq!(hits.len(), k.min(count));
        prop_assert!(hits.iter().all(|(position, distance)| *position < count && *distance >= 0.0));
        for pair in hits.windows(2) {
            prop_assert!(pair[0].1 <= pair[1].1);
        }
    }

    /// Property: per-category counts add up to the overall counts and
    /// failed judgments never count.
    #[test]
    fn prop_aggregate_counts_are_consistent(
        entries in prop::collection::vec((1i64..=5, prop::option::of(any::<bool>())), 0..60),
    ) {
        let failures = entries.iter().filter(|(_, c)| c.is_none()).count();
        let correct = entries.iter().filter(|(_, c)| *c == Some(true)).count();
        let report = EvaluationAggregator::aggregate(
            entries.iter().map(|(category, c)| outcome(*category, *c)),
        );

        prop_assert_eq!(report.failures.len(), failures);
        prop_assert_eq!(report.total, entries.len() - failures);
        prop_assert_eq!(report.correct, correct);
        prop_assert_eq!(report.items.len(), report.total);
        prop_assert_eq!(report.categories.values().map(|s| s.total).sum::<usize>(), report.total);
        prop_assert_eq!(report.categories.values().map(|s| s.correct).sum::<usize>(), report.correct);
        prop_assert!((0.0..=1.0).contains(&report.accuracy));
        prop_assert!(report.categories.values().all(|s| s.total > 0));
    }

    /// Property: answer text is inserted verbatim, even when it looks like
    /// a placeholder.
    #[test]
    fn prop_prompt_keeps_answers_verbatim(
        question in "[a-z {}]{0,30}",
        generated in prop::sample::select(vec!["{question}", "{gold_answer}", "{{x}}", "plain"]),
    ) {
        let prompt = build_prompt(&question, "gold", generated);
        let expected_question = format!("Question: {question}\nGold answer: gold");
        let expected_generated = format!("Generated answer: {generated}\n");
        prop_assert!(prompt.contains(&expected_question));
        prop_assert!(prompt.contains(&expected_generated));
    }

    /// Property: arbitrary judge output parses or fails cleanly.
    #[test]
    fn prop_parse_verdict_never_panics(content in ".{0,200}") {
        if let Ok(verdict) = parse_verdict(&content) {
            prop_assert_eq!(verdict.score, u8::from(verdict.label == JudgeLabel::Correct));
        }
    }

    /// Property: with no vector index, retrieval is the coverage ranking cut
    /// to `final_limit`, unscored.
    #[test]
    fn prop_coverage_only_retrieval_matches_filter(
        query in "[a-e ]{0,20}",
        contents in prop::collection::vec("[a-e ]{0,20}", 0..30),
        coverage_limit in 0usize..40,
        final_limit in 0usize..40,
    ) {
        let memories = memories(&contents);
        let orchestrator = RetrievalOrchestrator::new(
            Arc::new(InMemoryStore::with_memories(memories.clone())),
            VectorReranker::unavailable("no index"),
            Some(Arc::new(ShapeEmbedder)),
        )
        .expect("orchestrator");

        let outcome = orchestrator
            .retrieve_detailed(&query, coverage_limit, final_limit)
            .expect("retrieve");
        let expected: Vec<MemoryId> = CoverageFilter::new()
            .filter(&query, &memories, coverage_limit)
            .into_iter()
            .take(final_limit)
            .map(|i| memories[i].id)
            .collect();

        let returned: Vec<MemoryId> = outcome.memories.iter().map(|m| m.id).collect();
        prop_assert_eq!(returned, expected);
        prop_assert!(outcome.memories.iter().all(|m| m.score.abs() < f32::EPSILON));
        if memories.is_empty() {
            prop_assert_eq!(outcome.path, RetrievalPath::Empty);
        } else {
            prop_assert!(matches!(outcome.path, RetrievalPath::Degraded(_)));
        }
    }

    /// Property: reranked results only name stored coverage candidates, once
    /// each, even when the id map points outside the store.
    #[test]
    fn prop_reranked_ids_stay_within_store(
        query in "[a-e ]{0,20}",
        contents in prop::collection::vec("[a-e ]{0,20}", 1..30),
        index_entries in prop::collection::vec(
            (1i64..60, prop::collection::vec(0.0f32..25.0, 2)),
            1..60,
        ),
        coverage_limit in 0usize..40,
        final_limit in 0usize..40,
    ) {
        let memories = memories(&contents);
        let (ids, vectors): (Vec<MemoryId>, Vec<Vec<f32>>) = index_entries
            .into_iter()
            .map(|(id, vector)| (MemoryId::new(id), vector))
            .unzip();
        let index = FlatIndex::new(2, vectors).expect("index");
        let orchestrator = RetrievalOrchestrator::new(
            Arc::new(InMemoryStore::with_memories(memories.clone())),
            VectorReranker::new(Box::new(index), ids),
            Some(Arc::new(ShapeEmbedder)),
        )
        .expect("orchestrator");

        let outcome = orchestrator
            .retrieve_detailed(&query, coverage_limit, final_limit)
            .expect("retrieve");
        let candidates: HashSet<MemoryId> = CoverageFilter::new()
            .filter(&query, &memories, coverage_limit)
            .into_iter()
            .map(|i| memories[i].id)
            .collect();

        prop_assert!(outcome.memories.len() <= final_limit);
        prop_assert!(outcome.memories.iter().all(|m| candidates.contains(&m.id)));
        let unique: HashSet<_> = outcome.memories.iter().map(|m| m.id).collect();
        prop_assert_eq!(unique.len(), outcome.memories.len());
        if outcome.path == RetrievalPath::Reranked {
            for pair in outcome.memories.windows(2) {
                prop_assert!(pair[0].score <= pair[1].score);
            }
        }
    }

    /// Property: backoff grows linearly with the attempt number.
    #[test]
    fn prop_backoff_is_linear(unit_ms in 0u64..1_000, attempt in 1u32..10) {
        let policy = RetryPolicy::new(10, Duration::from_millis(unit_ms));
        prop_assert_eq!(
            policy.delay_after(attempt),
            Duration::from_millis(unit_ms * 2 * u64::from(attempt))
        );
    }
}
