//! Structured logging configuration.

use crate::config::ObservabilitySettings;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name; anything other than `json` is pretty.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Optional log file; stderr when unset.
    pub file: Option<PathBuf>,
    /// Event filter.
    pub filter: EnvFilter,
}

impl LoggingConfig {
    /// Builds logging configuration from settings.
    ///
    /// Filter precedence: `RUST_LOG`, then the configured directive, then
    /// `debug` when verbose or `info` otherwise.
    #[must_use]
    pub fn from_settings(settings: &ObservabilitySettings, verbose: bool) -> Self {
        let default_level = if verbose { "debug" } else { "info" };
        let directive = std::env::var("RUST_LOG")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| settings.log_filter.clone())
            .unwrap_or_else(|| default_level.to_string());

        let filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
            eprintln_fallback(&directive, &e);
            EnvFilter::new(default_level)
        });

        Self {
            format: settings.log_format,
            file: settings.log_file.clone(),
            filter,
        }
    }
}

#[allow(clippy::print_stderr)]
fn eprintln_fallback(directive: &str, err: &tracing_subscriber::filter::ParseError) {
    // The subscriber is not installed yet, so this cannot go through tracing.
    eprintln!("vacmem: invalid log filter '{directive}': {err}");
}
