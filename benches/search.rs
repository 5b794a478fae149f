//! Benchmarks for retrieval operations.
//!
//! Benchmark targets (per query):
//! - 1,000 memories: <5ms coverage filter
//! - 10,000 memories: <50ms coverage filter
//!
//! These benchmarks cover:
//! - Coverage filtering over a synthetic conversation
//! - Flat index search over random vectors
//! - Full coverage-only retrieval through the orchestrator

// Criterion macros generate items without docs - this is expected for benchmarks
// Benchmarks use expect/unwrap for simplicity - panics are acceptable in benchmarks
#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;
use vacmem::models::Memory;
use vacmem::storage::{FlatIndex, InMemoryStore};
use vacmem::{CoverageFilter, RetrievalOrchestrator, VectorIndex, VectorReranker};

// ============================================================================
// Helper Functions
// ============================================================================

const SUBJECTS: [&str; 6] = ["Alice", "Bob", "Caroline", "Melanie", "Dave", "Erin"];
const ACTIVITIES: [&str; 8] = [
    "went hiking in the mountains",
    "adopted a rescue dog",
    "painted a sunrise over the lake",
    "bought a shell necklace in Hawaii",
    "started a pottery class",
    "moved to Sweden for work",
    "ran a charity marathon",
    "cooked pizza for friends",
];

/// Generates a deterministic synthetic conversation.
fn create_memories(count: usize) -> Vec<Memory> {
    (0..count)
        .map(|i| {
            let subject = SUBJECTS[i % SUBJECTS.len()];
            let activity = ACTIVITIES[(i / SUBJECTS.len()) % ACTIVITIES.len()];
            let id = i64::try_from(i).expect("id fits");
            Memory::new(id, format!("{subject} {activity} in week {}", i % 52))
        })
        .collect()
}

/// Generates deterministic pseudo-random vectors.
fn create_vectors(count: usize, dimensions: usize) -> Vec<Vec<f32>> {
    let mut state: u32 = 0x9E37_79B9;
    (0..count)
        .map(|_| {
            (0..dimensions)
                .map(|_| {
                    state ^= state << 13;
                    state ^= state >> 17;
                    state ^= state << 5;
                    #[allow(clippy::cast_precision_loss)]
                    let value = (state % 10_000) as f32 / 10_000.0;
                    value
                })
                .collect()
        })
        .collect()
}

// ============================================================================
// Coverage Filter Benchmarks
// ============================================================================

fn bench_coverage_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("coverage_filter");
    group.measurement_time(Duration::from_secs(10));
    let filter = CoverageFilter::new();

    for size in [100, 1_000, 10_000] {
        let memories = create_memories(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &memories, |b, memories| {
            b.iter(|| {
                filter.filter(
                    black_box("When did Caroline move to Sweden for work?"),
                    memories,
                    50,
                )
            });
        });
    }

    group.finish();
}

// ============================================================================
// Vector Index Benchmarks
// ============================================================================

fn bench_flat_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("flat_index_search");
    let dimensions = 384;

    for size in [1_000, 10_000] {
        let index = FlatIndex::new(dimensions, create_vectors(size, dimensions)).expect("index");
        let query = create_vectors(1, dimensions).remove(0);
        group.bench_with_input(BenchmarkId::from_parameter(size), &index, |b, index| {
            b.iter(|| index.search(black_box(&query), index.len()).expect("search"));
        });
    }

    group.finish();
}

// ============================================================================
// Orchestrator Benchmarks
// ============================================================================

fn bench_coverage_only_retrieval(c: &mut Criterion) {
    let store = Arc::new(InMemoryStore::with_memories(create_memories(1_000)));
    let orchestrator =
        RetrievalOrchestrator::new(store, VectorReranker::unavailable("benchmark"), None)
            .expect("orchestrator");

    c.bench_function("retrieve_coverage_only_1000", |b| {
        b.iter(|| {
            orchestrator
                .retrieve(black_box("What did Melanie buy in Hawaii?"), 50, 15)
                .expect("retrieve")
        });
    });
}

criterion_group!(
    benches,
    bench_coverage_filter,
    bench_flat_index,
    bench_coverage_only_retrieval
);
criterion_main!(benches);
