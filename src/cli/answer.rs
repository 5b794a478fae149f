//! Answer CLI command: run the question pipeline over a questions file.

use super::factory::{build_orchestrator, build_synthesizer};
use crate::config::VacConfig;
use crate::io::{load_question_records, write_json_atomic};
use crate::services::process_questions;
use anyhow::Context;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

/// Suffix appended to the questions file stem for the default output path.
pub const ANSWERS_SUFFIX: &str = "_answers";

/// Default output path: `<dir>/<stem>_answers.json`.
#[must_use]
pub fn default_answers_path(questions_file: &Path) -> PathBuf {
    let stem = questions_file
        .file_stem()
        .map_or_else(|| "questions".into(), |s| s.to_string_lossy());
    questions_file.with_file_name(format!("{stem}{ANSWERS_SUFFIX}.json"))
}

/// Executes the answer command.
///
/// # Errors
///
/// Returns an error if configuration is unusable, the questions file cannot
/// be read, the run is cancelled, or the output cannot be written.
pub fn cmd_answer(
    config: &VacConfig,
    questions_file: &Path,
    output: Option<&Path>,
    generate: bool,
    cancel: &AtomicBool,
) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(config)?;
    let synthesizer = build_synthesizer(config, generate)?;
    let questions = load_question_records(questions_file)?;

    let results = process_questions(
        &orchestrator,
        &synthesizer,
        &questions,
        config.retrieval,
        Some(cancel),
    )?;

    let output = output.map_or_else(|| default_answers_path(questions_file), Path::to_path_buf);
    write_json_atomic(&output, &results)
        .with_context(|| format!("saving answers to {}", output.display()))?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(
        handle,
        "Processed {} questions ({} retrieval)",
        results.questions_processed,
        if orchestrator.semantic_enabled() {
            "reranked"
        } else {
            "coverage-only"
        }
    )?;
    writeln!(handle, "Saved to: {}", output.display())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_answers_path() {
        assert_eq!(
            default_answers_path(Path::new("data/locomo_questions.json")),
            PathBuf::from("data/locomo_questions_answers.json")
        );
    }
}
