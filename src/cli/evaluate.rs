//! Evaluate CLI command: judge a results file and write the report artifact.

use super::factory::build_judge;
use crate::config::VacConfig;
use crate::io::{ReportArtifact, default_output_path, describe_filter, load_results_records};
use crate::models::EvaluationReport;
use crate::services::EvaluationRunner;
use anyhow::Context;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

const RULE_WIDTH: usize = 80;

/// Returns at most `max_chars` characters of `text`.
fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Writes the console summary of an evaluation.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_summary<W: Write>(
    writer: &mut W,
    report: &EvaluationReport,
    filter: &str,
    skipped: usize,
) -> io::Result<()> {
    let rule = "=".repeat(RULE_WIDTH);
    writeln!(writer, "{rule}")?;
    writeln!(writer, "JUDGE RESULTS ({filter})")?;
    writeln!(writer, "{rule}")?;
    writeln!(
        writer,
        "Correct: {}/{} = {:.1}%",
        report.correct,
        report.total,
        report.accuracy * 100.0
    )?;
    writeln!(
        writer,
        "Wrong: {}/{} = {:.1}%",
        report.wrong(),
        report.total,
        (1.0 - report.accuracy) * 100.0
    )?;
    if skipped > 0 {
        writeln!(writer, "Skipped by category filter: {skipped}")?;
    }
    if !report.failures.is_empty() {
        writeln!(
            writer,
            "Judge failures (excluded from accuracy): {}",
            report.failures.len()
        )?;
    }
    writeln!(writer)?;

    writeln!(writer, "BREAKDOWN BY CATEGORY:")?;
    for (id, stats) in &report.categories {
        writeln!(
            writer,
            "  Category {id} ({}): {}/{} = {:.1}%",
            id.label(),
            stats.correct,
            stats.total,
            stats.accuracy() * 100.0
        )?;
    }
    writeln!(writer)?;

    let wrong: Vec<_> = report.wrong_answers().collect();
    if !wrong.is_empty() {
        writeln!(writer, "WRONG ANSWERS ({}):", wrong.len())?;
        writeln!(writer, "{}", "-".repeat(RULE_WIDTH))?;
        for item in wrong {
            writeln!(writer, "Q: {}", item.question)?;
            writeln!(writer, "GT: {}", item.ground_truth)?;
            writeln!(writer, "AI: {}...", preview(&item.generated_answer, 100))?;
            writeln!(writer, "Judge: {}", item.judge_label)?;
            writeln!(writer, "Reasoning: {}...", preview(&item.judge_reasoning, 150))?;
            writeln!(writer)?;
        }
    }

    for failure in &report.failures {
        writeln!(
            writer,
            "FAILED (category {}): {} [{}]",
            failure.category, failure.question, failure.error
        )?;
    }
    Ok(())
}

/// Executes the evaluate command.
///
/// # Errors
///
/// Returns an error if the judge is not configured, the results file cannot
/// be read, the run is cancelled, or the artifact cannot be written.
pub fn cmd_evaluate(
    config: &VacConfig,
    results_file: &Path,
    output: Option<&Path>,
    concurrency: Option<usize>,
    cancel: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let judge = build_judge(config)?;
    let records = load_results_records(results_file)?;

    let runner = EvaluationRunner::new(judge)
        .with_categories(config.judge.categories.clone())
        .with_concurrency(concurrency.unwrap_or(config.judge.concurrency))
        .with_cancel_flag(cancel);
    let run = runner.run(records)?;

    let artifact = ReportArtifact::new(
        &run.report,
        results_file,
        runner.judge().model(),
        runner.categories(),
        run.skipped,
    );
    let output = output.map_or_else(|| default_output_path(results_file), Path::to_path_buf);
    artifact
        .write(&output)
        .with_context(|| format!("saving judge report to {}", output.display()))?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_summary(
        &mut handle,
        &run.report,
        &describe_filter(runner.categories()),
        run.skipped,
    )?;
    writeln!(handle, "Saved to: {}", output.display())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryId, JudgeLabel, JudgeOutcome, JudgeVerdict, QuestionRecord};
    use crate::services::EvaluationAggregator;

    fn outcome(question: &str, category: i64, label: JudgeLabel, answer: &str) -> JudgeOutcome {
        JudgeOutcome::Judged {
            record: QuestionRecord {
                question: question.to_string(),
                ground_truth: "A shell necklace".to_string(),
                generated_answer: answer.to_string(),
                category: CategoryId(category),
            },
            verdict: JudgeVerdict::new(label, "r".repeat(300)),
        }
    }

    #[test]
    fn test_summary_lines() {
        let report = EvaluationAggregator::aggregate(vec![
            outcome("What did I get?", 1, JudgeLabel::Correct, "a shell necklace"),
            outcome("When?", 2, JudgeLabel::Wrong, &"x".repeat(250)),
        ]);
        let mut out = Vec::new();
        write_summary(&mut out, &report, "Cat1-4 only (no adversarial Cat5)", 3)
            .expect("write");
        let text = String::from_utf8(out).expect("utf8");

        assert!(text.contains("Correct: 1/2 = 50.0%"));
        assert!(text.contains("Wrong: 1/2 = 50.0%"));
        assert!(text.contains("Skipped by category filter: 3"));
        assert!(text.contains("  Category 1 (Single-hop (Factual)): 1/1 = 100.0%"));
        assert!(text.contains("  Category 2 (Temporal): 0/1 = 0.0%"));
        assert!(text.contains("WRONG ANSWERS (1):"));
        assert!(text.contains(&format!("AI: {}...\n", "x".repeat(100))));
        assert!(text.contains(&format!("Reasoning: {}...\n", "r".repeat(150))));
        assert!(!text.contains("Q: What did I get?"));
    }

    #[test]
    fn test_preview_counts_chars() {
        assert_eq!(preview("héllo", 2), "hé");
    }
}
