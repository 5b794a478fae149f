//! Question and results file loading.
//!
//! Accepts either a bare JSON array of records or an object with a `results`
//! array (the shape the pipeline writes). Unknown keys are ignored.

use crate::models::{CategoryId, QuestionRecord};
use crate::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordsDocument {
    Wrapped { results: Vec<RawRecord> },
    Bare(Vec<RawRecord>),
}

/// A record as it appears on disk, before the gold answer is resolved.
#[derive(Deserialize)]
struct RawRecord {
    question: String,
    #[serde(default)]
    ground_truth: Option<String>,
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    generated_answer: Option<String>,
    #[serde(default)]
    category: CategoryId,
}

impl RawRecord {
    /// `ground_truth` wins over `answer` when both are present.
    fn into_record(self, position: usize, require_generated: bool) -> Result<QuestionRecord> {
        let ground_truth = self.ground_truth.or(self.answer).ok_or_else(|| {
            Error::InvalidInput(format!(
                "record {position} has neither `ground_truth` nor `answer`"
            ))
        })?;
        let generated_answer = match self.generated_answer {
            Some(answer) => answer,
            None if require_generated => {
                return Err(Error::InvalidInput(format!(
                    "record {position} has no `generated_answer`"
                )));
            },
            None => String::new(),
        };
        Ok(QuestionRecord {
            question: self.question,
            ground_truth,
            generated_answer,
            category: self.category,
        })
    }
}

fn parse_records(content: &str, require_generated: bool) -> Result<Vec<QuestionRecord>> {
    let document: RecordsDocument = serde_json::from_str(content).map_err(|e| {
        Error::InvalidInput(format!(
            "expected a JSON array of questions or an object with a `results` array: {e}"
        ))
    })?;
    let raw = match document {
        RecordsDocument::Wrapped { results } | RecordsDocument::Bare(results) => results,
    };
    raw.into_iter()
        .enumerate()
        .map(|(position, record)| record.into_record(position, require_generated))
        .collect()
}

fn read_file(path: &Path, operation: &str) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::OperationFailed {
        operation: operation.to_string(),
        cause: format!("{}: {e}", path.display()),
    })
}

/// Parses question records from a JSON string.
///
/// The gold answer is read from `ground_truth`, falling back to `answer`.
/// A missing `generated_answer` is left empty.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the document matches neither shape or a
/// record has no gold answer.
pub fn parse_question_records(content: &str) -> Result<Vec<QuestionRecord>> {
    parse_records(content, false)
}

/// Parses answered records for judging.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the document matches neither shape or a
/// record lacks a gold answer or a `generated_answer`.
pub fn parse_results_records(content: &str) -> Result<Vec<QuestionRecord>> {
    parse_records(content, true)
}

/// Loads question records from a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_question_records(path: impl AsRef<Path>) -> Result<Vec<QuestionRecord>> {
    parse_question_records(&read_file(path.as_ref(), "read_questions_file")?)
}

/// Loads answered records from a results file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or a record has no
/// `generated_answer`.
pub fn load_results_records(path: impl AsRef<Path>) -> Result<Vec<QuestionRecord>> {
    parse_results_records(&read_file(path.as_ref(), "read_results_file")?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wrapped_results() {
        let records = parse_results_records(
            r#"{"questions_processed": 1, "results": [
                {"question": "Q", "ground_truth": "A", "generated_answer": "G", "category": 3}
            ]}"#,
        )
        .expect("parse");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].generated_answer, "G");
        assert_eq!(records[0].category, CategoryId(3));
    }

    #[test]
    fn test_parse_bare_question_array() {
        let records =
            parse_question_records(r#"[{"question": "Q", "answer": "A"}]"#).expect("parse");
        assert_eq!(records[0].ground_truth, "A");
        assert_eq!(records[0].category, CategoryId(0));
        assert!(records[0].generated_answer.is_empty());
    }

    #[test]
    fn test_ground_truth_preferred_over_answer() {
        let content = r#"{"results": [{
            "question": "Q",
            "ground_truth": "gold",
            "answer": "legacy",
            "generated_answer": "G",
            "category": 1,
            "memories_used": 4
        }]}"#;
        let records = parse_results_records(content).expect("parse");
        assert_eq!(records[0].ground_truth, "gold");
        assert_eq!(
            parse_question_records(content).expect("parse")[0].ground_truth,
            "gold"
        );
    }

    #[test]
    fn test_results_require_generated_answer() {
        let content = r#"[
            {"question": "Q1", "ground_truth": "A", "generated_answer": "G"},
            {"question": "Q2", "ground_truth": "B"}
        ]"#;
        let err = parse_results_records(content).expect_err("missing answer");
        assert!(matches!(&err, Error::InvalidInput(msg) if msg.contains("record 1")));
        assert_eq!(parse_question_records(content).expect("questions").len(), 2);
    }

    #[test]
    fn test_missing_gold_answer_is_rejected() {
        assert!(matches!(
            parse_question_records(r#"[{"question": "Q"}]"#),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        assert!(matches!(
            parse_question_records(r#"{"items": []}"#),
            Err(Error::InvalidInput(_))
        ));
    }
}
