//! Retrieve CLI command.

use super::factory::build_orchestrator;
use crate::config::VacConfig;
use crate::models::{RetrievalOutcome, RetrievalPath};
use clap::ValueEnum;
use serde::Serialize;
use std::io::{self, Write};

/// Output format for the retrieve command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum RetrieveOutputFormat {
    /// One block per memory (default).
    #[default]
    Text,
    /// JSON object with the path taken and `{id, content, score}` memories.
    Json,
}

/// Arguments for the retrieve command.
#[derive(Debug, Clone)]
pub struct RetrieveArgs {
    /// Query text.
    pub query: String,
    /// Override for the coverage limit.
    pub coverage_limit: Option<usize>,
    /// Override for the final limit.
    pub final_limit: Option<usize>,
    /// Output format.
    pub format: RetrieveOutputFormat,
}

/// Writes a retrieval outcome as text.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_text<W: Write>(writer: &mut W, outcome: &RetrievalOutcome) -> io::Result<()> {
    let path = match &outcome.path {
        RetrievalPath::Degraded(reason) => format!("degraded: {}", reason.as_str()),
        other => other.as_str().to_string(),
    };
    writeln!(
        writer,
        "Retrieved {} memories ({} coverage candidates, {path})",
        outcome.memories.len(),
        outcome.candidate_count
    )?;
    writeln!(writer)?;
    for memory in &outcome.memories {
        writeln!(writer, "  [{:.4}] #{}", memory.score, memory.id)?;
        writeln!(writer, "       {}", memory.content)?;
    }
    Ok(())
}

/// Writes a retrieval outcome as JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write>(
    writer: &mut W,
    outcome: &RetrievalOutcome,
) -> anyhow::Result<()> {
    #[derive(Serialize)]
    struct Output<'a> {
        path: &'a str,
        memories: &'a [crate::models::RetrievedMemory],
    }

    let json = serde_json::to_string_pretty(&Output {
        path: outcome.path.as_str(),
        memories: &outcome.memories,
    })?;
    writeln!(writer, "{json}")?;
    Ok(())
}

/// Executes the retrieve command.
///
/// # Errors
///
/// Returns an error if the retrieval stack cannot be built, the store cannot
/// be read, or output fails.
pub fn cmd_retrieve(
    config: &VacConfig,
    args: &RetrieveArgs,
) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(config)?;
    let outcome = orchestrator.retrieve_detailed(
        &args.query,
        args.coverage_limit.unwrap_or(config.retrieval.coverage_limit),
        args.final_limit.unwrap_or(config.retrieval.final_limit),
    )?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match args.format {
        RetrieveOutputFormat::Text => {
            write_text(&mut handle, &outcome)?;
            Ok(())
        },
        RetrieveOutputFormat::Json => write_json(&mut handle, &outcome),
    }
}
