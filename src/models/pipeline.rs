//! Output of the question-answering pipeline.

use super::CategoryId;
use serde::{Deserialize, Serialize};

/// One processed question.
///
/// Serialized field names match [`QuestionRecord`](super::QuestionRecord), so a
/// processed results file feeds straight into evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedQuestion {
    /// The question text.
    pub question: String,
    /// Gold answer carried through from the input.
    pub ground_truth: String,
    /// Question category.
    pub category: CategoryId,
    /// Synthesized answer.
    pub generated_answer: String,
    /// How many memories the retrieval stage returned.
    pub retrieved_memories: usize,
}

/// Results of a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedResults {
    /// Number of questions processed.
    pub questions_processed: usize,
    /// Per-question results in input order.
    pub results: Vec<ProcessedQuestion>,
}

impl ProcessedResults {
    /// Appends a processed question.
    pub fn push(&mut self, question: ProcessedQuestion) {
        self.results.push(question);
        self.questions_processed += 1;
    }
}
