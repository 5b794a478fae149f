//! Judge verdicts and evaluation reports.

use super::CategoryId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Binary judge label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JudgeLabel {
    /// The generated answer matches the gold answer.
    Correct,
    /// The generated answer does not match.
    Wrong,
}

impl JudgeLabel {
    /// Parses a label case-insensitively, ignoring surrounding whitespace.
    ///
    /// Returns `None` for anything other than `CORRECT` or `WRONG`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "CORRECT" => Some(Self::Correct),
            "WRONG" => Some(Self::Wrong),
            _ => None,
        }
    }

    /// Returns the canonical uppercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Correct => "CORRECT",
            Self::Wrong => "WRONG",
        }
    }
}

impl fmt::Display for JudgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single judge decision.
///
/// `score` is always derived from `label`; construct through [`JudgeVerdict::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeVerdict {
    /// The label.
    pub label: JudgeLabel,
    /// 1 for `CORRECT`, 0 otherwise.
    pub score: u8,
    /// Judge explanation (raw response text when no reasoning field was returned).
    pub reasoning: String,
}

impl JudgeVerdict {
    /// Creates a verdict, deriving the score from the label.
    #[must_use]
    pub fn new(label: JudgeLabel, reasoning: impl Into<String>) -> Self {
        let score = u8::from(label == JudgeLabel::Correct);
        Self {
            label,
            score,
            reasoning: reasoning.into(),
        }
    }

    /// Returns true when the verdict is `CORRECT`.
    #[must_use]
    pub const fn is_correct(&self) -> bool {
        self.score == 1
    }
}

/// One question from a results file, ready to be judged.
///
/// Deserializing this type expects the results shape. Question files that
/// use `answer` for the gold answer go through
/// [`parse_question_records`](crate::io::parse_question_records).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// The question text.
    pub question: String,
    /// Gold answer.
    pub ground_truth: String,
    /// Answer produced by the pipeline. Empty before answering.
    pub generated_answer: String,
    /// Question category.
    #[serde(default)]
    pub category: CategoryId,
}

/// A judged question, in result-artifact shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgedItem {
    /// The question text.
    pub question: String,
    /// Gold answer.
    pub ground_truth: String,
    /// Generated answer.
    pub generated_answer: String,
    /// Question category.
    pub category: CategoryId,
    /// Judge label.
    pub judge_label: JudgeLabel,
    /// Judge score (0 or 1).
    pub judge_score: u8,
    /// Judge reasoning.
    pub judge_reasoning: String,
}

impl JudgedItem {
    /// Combines a question with its verdict.
    #[must_use]
    pub fn new(record: QuestionRecord, verdict: JudgeVerdict) -> Self {
        Self {
            question: record.question,
            ground_truth: record.ground_truth,
            generated_answer: record.generated_answer,
            category: record.category,
            judge_label: verdict.label,
            judge_score: verdict.score,
            judge_reasoning: verdict.reasoning,
        }
    }
}

/// A question whose judge call exhausted its retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeFailure {
    /// The question text.
    pub question: String,
    /// Question category.
    pub category: CategoryId,
    /// Last error seen.
    pub error: String,
}

/// Per-question evaluation result.
#[derive(Debug, Clone)]
pub enum JudgeOutcome {
    /// The judge returned a verdict.
    Judged {
        /// The question.
        record: QuestionRecord,
        /// The verdict.
        verdict: JudgeVerdict,
    },
    /// Every attempt failed.
    Failed {
        /// The question.
        record: QuestionRecord,
        /// Last error seen.
        error: String,
    },
}

impl JudgeOutcome {
    /// Returns the question this outcome belongs to.
    #[must_use]
    pub const fn record(&self) -> &QuestionRecord {
        match self {
            Self::Judged { record, .. } | Self::Failed { record, .. } => record,
        }
    }
}

/// Correct/total counts for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryStats {
    /// Category identifier.
    pub category_id: CategoryId,
    /// Number of `CORRECT` verdicts.
    pub correct: usize,
    /// Number of judged questions.
    pub total: usize,
}

impl CategoryStats {
    /// Accuracy in `[0, 1]`; `0.0` when nothing was judged.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct, self.total)
    }
}

/// Aggregated evaluation results.
///
/// Produced once by the aggregator and never modified afterwards.
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    /// Overall accuracy over judged questions.
    pub accuracy: f64,
    /// Number of `CORRECT` verdicts.
    pub correct: usize,
    /// Number of judged questions (failures excluded).
    pub total: usize,
    /// Per-category counts, only for observed categories.
    pub categories: BTreeMap<CategoryId, CategoryStats>,
    /// Judged questions in evaluation order.
    pub items: Vec<JudgedItem>,
    /// Questions whose judge call failed, in evaluation order.
    pub failures: Vec<JudgeFailure>,
}

impl EvaluationReport {
    /// Judged items with score 0, in evaluation order.
    pub fn wrong_answers(&self) -> impl Iterator<Item = &JudgedItem> {
        self.items.iter().filter(|item| item.judge_score == 0)
    }

    /// Number of wrong answers.
    #[must_use]
    pub fn wrong(&self) -> usize {
        self.total - self.correct
    }
}

/// Safe ratio that reports `0.0` for an empty denominator.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
