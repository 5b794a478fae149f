//! # vacmem
//!
//! Memory retrieval for conversational question answering, plus a judge-based
//! evaluation harness that measures how often generated answers match gold answers.
//!
//! Retrieval runs in two stages: a lexical coverage filter narrows the memory set,
//! then a dense vector index reranks the survivors. When no embedder or index is
//! available the pipeline degrades to coverage order instead of failing.
//!
//! ## Features
//!
//! - Keyword coverage filter with stable, deterministic ordering
//! - Flat (brute-force L2) or usearch HNSW vector index with a position → memory id map
//! - Answer synthesis with an optional OpenAI-compatible generator
//! - Generous LLM judge with bounded linear backoff
//! - Category-stratified accuracy reports written atomically
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vacmem::services::{RetrievalOrchestrator, VectorReranker};
//! use vacmem::storage::SqliteMemoryStore;
//!
//! let store = Arc::new(SqliteMemoryStore::open("memories.db")?);
//! let orchestrator = RetrievalOrchestrator::new(store, VectorReranker::unavailable("no index"), None)?;
//! let memories = orchestrator.retrieve("Does Alice like pizza?", 50, 15)?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod cli;
pub mod config;
pub mod embedding;
pub mod io;
pub mod llm;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

pub use config::VacConfig;
pub use embedding::Embedder;
pub use llm::LlmProvider;
pub use models::{
    CategoryId, CategoryStats, EvaluationReport, JudgeLabel, JudgeVerdict, Memory, MemoryId,
    RetrievedMemory,
};
pub use services::{
    AnswerSynthesizer, CoverageFilter, EvaluationAggregator, JudgeClient, RetrievalOrchestrator,
    VectorReranker,
};
pub use storage::{MemoryStore, VectorIndex};

/// Error type for vacmem operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Malformed input files, empty text passed to an embedder |
/// | `OperationFailed` | I/O errors, SQLite failures, HTTP transport failures, non-2xx responses |
/// | `Configuration` | Missing credentials, embedder/index dimension mismatch, unreadable config |
/// | `MalformedResponse` | Judge output that is not JSON or carries no valid `label` |
/// | `Cancelled` | A run was interrupted between questions |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - `SQLite` queries fail
    /// - Filesystem I/O errors occur
    /// - An HTTP request fails or returns a non-success status
    /// - The vector index is unavailable or rejects a query
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// Configuration is invalid. Fatal at startup.
    ///
    /// Raised when:
    /// - The judge API key is missing
    /// - Embedder and vector index dimensions disagree
    /// - A required vector index cannot be loaded
    /// - The config file cannot be read or parsed
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An external service answered with something we cannot interpret.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The run was cancelled before completion.
    #[error("cancelled")]
    Cancelled,
}

impl Error {
    /// Shorthand for building an [`Error::OperationFailed`].
    pub fn operation(operation: impl Into<String>, cause: impl ToString) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for vacmem operations.
pub type Result<T> = std::result::Result<T, Error>;
