//! Data models for vacmem.
//!
//! This module contains the core data structures shared by retrieval and evaluation.

mod category;
mod evaluation;
mod memory;
mod pipeline;
mod retrieval;

pub use category::{CATEGORY_LABELS, CategoryId, label_for};
pub use evaluation::{
    CategoryStats, EvaluationReport, JudgeFailure, JudgeLabel, JudgeOutcome, JudgeVerdict,
    JudgedItem, QuestionRecord,
};
pub(crate) use evaluation::ratio;
pub use memory::{Memory, MemoryId};
pub use pipeline::{ProcessedQuestion, ProcessedResults};
pub use retrieval::{
    DegradeReason, RetrievalOutcome, RetrievalPath, RetrievedMemory, ScoredCandidate,
};
