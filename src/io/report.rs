//! Judged evaluation report artifact.

use crate::models::{CategoryId, CategoryStats, EvaluationReport, JudgeFailure, JudgedItem};
use crate::Result;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name recorded for the grading rubric.
pub const JUDGE_PROMPT_NAME: &str = "ACCURACY_PROMPT (generous grading)";

/// Suffix appended to the results file stem for the default output path.
pub const JUDGED_SUFFIX: &str = "_generous_judged";

/// Per-category counts keyed by category id.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryBreakdown {
    /// Correct verdicts.
    pub correct: usize,
    /// Judged questions.
    pub total: usize,
    /// `correct / total`.
    pub accuracy: f64,
}

/// Per-category counts with the category label.
#[derive(Debug, Clone, Serialize)]
pub struct NamedCategoryBreakdown {
    /// Correct verdicts.
    pub correct: usize,
    /// Judged questions.
    pub total: usize,
    /// `correct / total`.
    pub accuracy: f64,
    /// Human-readable category label.
    pub label: String,
}

/// The JSON document written after an evaluation run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportArtifact {
    /// Results file that was judged.
    pub source_file: String,
    /// Judge model description.
    pub judge_model: String,
    /// Rubric name.
    pub judge_prompt: String,
    /// Category filter description.
    pub filter: String,
    /// UTC timestamp, RFC 3339.
    pub generated_at: String,
    /// Overall accuracy over judged questions.
    pub llm_judge_accuracy: f64,
    /// Correct verdicts.
    pub llm_judge_correct: usize,
    /// Judged questions.
    pub llm_judge_total: usize,
    /// Questions excluded by the category filter.
    pub skipped: usize,
    /// Breakdown keyed by numeric category id.
    pub category_breakdown: BTreeMap<String, CategoryBreakdown>,
    /// Breakdown keyed by category id, with labels.
    pub category_breakdown_named: BTreeMap<String, NamedCategoryBreakdown>,
    /// Every judged question in input order.
    pub judge_results: Vec<JudgedItem>,
    /// Questions whose judge calls were exhausted.
    pub judge_failures: Vec<JudgeFailure>,
}

impl ReportArtifact {
    /// Builds the artifact from an aggregated report.
    #[must_use]
    pub fn new(
        report: &EvaluationReport,
        source_file: &Path,
        judge_model: &str,
        categories: &[CategoryId],
        skipped: usize,
    ) -> Self {
        let category_breakdown = report
            .categories
            .iter()
            .map(|(id, stats)| (id.to_string(), CategoryBreakdown::from(stats)))
            .collect();
        let category_breakdown_named = report
            .categories
            .iter()
            .map(|(id, stats)| {
                (
                    id.to_string(),
                    NamedCategoryBreakdown {
                        correct: stats.correct,
                        total: stats.total,
                        accuracy: stats.accuracy(),
                        label: id.label().into_owned(),
                    },
                )
            })
            .collect();

        Self {
            source_file: source_file.display().to_string(),
            judge_model: format!("{judge_model} (GENEROUS - Mem0 official)"),
            judge_prompt: JUDGE_PROMPT_NAME.to_string(),
            filter: describe_filter(categories),
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            llm_judge_accuracy: report.accuracy,
            llm_judge_correct: report.correct,
            llm_judge_total: report.total,
            skipped,
            category_breakdown,
            category_breakdown_named,
            judge_results: report.items.clone(),
            judge_failures: report.failures.clone(),
        }
    }

    /// Writes the artifact atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn write(&self, path: &Path) -> Result<()> {
        super::write_json_atomic(path, self)
    }
}

impl From<&CategoryStats> for CategoryBreakdown {
    fn from(stats: &CategoryStats) -> Self {
        Self {
            correct: stats.correct,
            total: stats.total,
            accuracy: stats.accuracy(),
        }
    }
}

/// Describes the category filter for the report header.
#[must_use]
pub fn describe_filter(categories: &[CategoryId]) -> String {
    let ids: Vec<i64> = categories.iter().map(|c| c.0).collect();
    if ids == [1, 2, 3, 4] {
        return "Cat1-4 only (no adversarial Cat5)".to_string();
    }
    let list = ids
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("Categories {list}")
}

/// Default output path: `<dir>/<stem>_generous_judged.json`.
#[must_use]
pub fn default_output_path(results_file: &Path) -> PathBuf {
    let stem = results_file
        .file_stem()
        .map_or_else(|| "results".into(), |s| s.to_string_lossy());
    results_file.with_file_name(format!("{stem}{JUDGED_SUFFIX}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JudgeLabel, JudgeVerdict, QuestionRecord};

    fn report() -> EvaluationReport {
        let record = QuestionRecord {
            question: "Q".to_string(),
            ground_truth: "A".to_string(),
            generated_answer: "A".to_string(),
            category: CategoryId(2),
        };
        let item = JudgedItem::new(record, JudgeVerdict::new(JudgeLabel::Correct, "same"));
        let mut categories = BTreeMap::new();
        categories.insert(
            CategoryId(2),
            CategoryStats {
                category_id: CategoryId(2),
                correct: 1,
                total: 1,
            },
        );
        EvaluationReport {
            accuracy: 1.0,
            correct: 1,
            total: 1,
            categories,
            items: vec![item],
            failures: Vec::new(),
        }
    }

    #[test]
    fn test_artifact_fields() {
        let categories = [CategoryId(1), CategoryId(2), CategoryId(3), CategoryId(4)];
        let artifact = ReportArtifact::new(
            &report(),
            Path::new("results/run.json"),
            "gpt-4o-mini",
            &categories,
            3,
        );
        let value = serde_json::to_value(&artifact).expect("serialize");

        assert_eq!(value["judge_model"], "gpt-4o-mini (GENEROUS - Mem0 official)");
        assert_eq!(value["filter"], "Cat1-4 only (no adversarial Cat5)");
        assert_eq!(value["llm_judge_total"], 1);
        assert_eq!(value["skipped"], 3);
        assert_eq!(value["category_breakdown"]["2"]["correct"], 1);
        assert_eq!(value["category_breakdown_named"]["2"]["label"], "Temporal");
        assert_eq!(value["judge_results"][0]["judge_label"], "CORRECT");
        assert_eq!(value["judge_results"][0]["judge_score"], 1);
    }

    #[test]
    fn test_describe_custom_filter() {
        assert_eq!(
            describe_filter(&[CategoryId(1), CategoryId(5)]),
            "Categories 1, 5"
        );
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("results/v4_run.json")),
            PathBuf::from("results/v4_run_generous_judged.json")
        );
    }
}
