//! Binary entry point for vacmem.
//!
//! This binary provides the CLI for retrieval, answer synthesis and judged
//! evaluation over a conversational memory store.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
// Allow needless_pass_by_value for command dispatch
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use vacmem::cli::{
    RetrieveArgs, RetrieveOutputFormat, cmd_answer, cmd_categories, cmd_evaluate, cmd_retrieve,
    install_cancel_flag,
};
use vacmem::config::VacConfig;
use vacmem::observability::{self, ObservabilityConfig};

/// vacmem - Two-stage memory retrieval with LLM-judged evaluation.
#[derive(Parser)]
#[command(name = "vacmem")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Retrieve memories for a single query.
    Retrieve {
        /// Query text.
        query: String,

        /// Maximum coverage candidates (defaults to configuration).
        #[arg(long)]
        coverage_limit: Option<usize>,

        /// Maximum memories returned (defaults to configuration).
        #[arg(long)]
        final_limit: Option<usize>,

        /// Output format.
        #[arg(short, long, value_enum, default_value_t = RetrieveOutputFormat::Text)]
        format: RetrieveOutputFormat,
    },

    /// Retrieve and synthesize answers for a questions file.
    Answer {
        /// Questions file (JSON array of question records).
        questions: PathBuf,

        /// Output path (defaults to `<stem>_answers.json`).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Generate answers with the configured LLM instead of extractive summaries.
        #[arg(long)]
        generate: bool,
    },

    /// Judge a results file and write the accuracy report.
    Evaluate {
        /// Results file with generated answers.
        results: PathBuf,

        /// Report output path (defaults to `<stem>_generous_judged.json`).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of concurrent judge calls.
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// List question categories.
    Categories,
}

/// Main entry point.
fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match VacConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init(ObservabilityConfig::from_settings(
        &config.observability,
        cli.verbose,
    )) {
        eprintln!("Failed to initialize observability: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(cli: Cli, config: &VacConfig) -> anyhow::Result<()> {
    match cli.command {
        Commands::Retrieve {
            query,
            coverage_limit,
            final_limit,
            format,
        } => {
            let args = RetrieveArgs {
                query,
                coverage_limit,
                final_limit,
                format,
            };
            cmd_retrieve(config, &args)
        },
        Commands::Answer {
            questions,
            output,
            generate,
        } => {
            let cancel = install_cancel_flag();
            cmd_answer(config, &questions, output.as_deref(), generate, &cancel)
        },
        Commands::Evaluate {
            results,
            output,
            concurrency,
        } => cmd_evaluate(
            config,
            &results,
            output.as_deref(),
            concurrency,
            install_cancel_flag(),
        ),
        Commands::Categories => Ok(cmd_categories()?),
    }
}
