//! Business logic services.
//!
//! Retrieval runs the coverage filter and the vector reranker through the
//! [`RetrievalOrchestrator`]; the [`AnswerSynthesizer`] turns retrieved
//! memories into answers; the [`JudgeClient`] and [`EvaluationRunner`] grade
//! those answers and aggregate accuracy.

mod coverage;
mod evaluation;
mod judge;
mod pipeline;
mod reranker;
mod retrieval;
mod synthesis;

pub use coverage::{CoverageFilter, tokenize};
pub use evaluation::{EvaluationAggregator, EvaluationRun, EvaluationRunner, select_categories};
pub use judge::{ACCURACY_PROMPT, JudgeClient, build_prompt, parse_verdict};
pub use pipeline::process_questions;
pub use reranker::VectorReranker;
pub use retrieval::RetrievalOrchestrator;
pub use synthesis::{AnswerSynthesizer, NO_INFORMATION_ANSWER};
