//! LLM client abstraction.
//!
//! Both the answer generator and the judge go through [`LlmProvider`], so the
//! services can be tested against scripted fakes.

mod openai;
mod resilience;

pub use openai::OpenAiClient;
pub use resilience::{RetryPolicy, Sleeper, ThreadSleeper, is_timeout_error, retry_with_backoff};

use crate::Result;
use std::time::Duration;

/// A chat model that turns a prompt into text.
pub trait LlmProvider: Send + Sync {
    /// Short provider name, used as the default model label.
    fn name(&self) -> &'static str;

    /// Sends `prompt` as a single user message and returns the reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the reply has no content.
    fn complete(&self, prompt: &str) -> Result<String>;

    /// Generates a completion constrained to a JSON object.
    ///
    /// # Errors
    ///
    /// Returns an error if the completion fails.
    ///
    /// Default implementation falls back to a plain completion; providers with
    /// a native JSON mode should override it.
    fn complete_json(&self, prompt: &str) -> Result<String> {
        self.complete(prompt)
    }
}

/// HTTP client configuration for LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LlmHttpConfig {
    /// Request timeout in milliseconds (0 to disable).
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds (0 to disable).
    pub connect_timeout_ms: u64,
}

impl Default for LlmHttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            connect_timeout_ms: 3_000,
        }
    }
}

impl LlmHttpConfig {
    /// Loads HTTP configuration from the judge settings.
    #[must_use]
    pub const fn from_config(config: &crate::config::JudgeConfig) -> Self {
        Self {
            timeout_ms: config.timeout_ms,
            connect_timeout_ms: config.connect_timeout_ms,
        }
    }
}

/// Builds the blocking HTTP client shared by LLM requests.
///
/// A zero timeout disables that timeout entirely.
#[must_use]
pub fn build_http_client(config: LlmHttpConfig) -> reqwest::blocking::Client {
    let limit = |ms: u64| (ms > 0).then(|| Duration::from_millis(ms));

    reqwest::blocking::Client::builder()
        .timeout(limit(config.timeout_ms))
        .connect_timeout(limit(config.connect_timeout_ms))
        .build()
        .unwrap_or_else(|err| {
            tracing::warn!(error = %err, "HTTP client setup failed, using defaults");
            reqwest::blocking::Client::new()
        })
}

/// Returns the JSON object embedded in a model reply.
///
/// A ```` ```json ```` fence wins; otherwise the span from the first `{` to the
/// last `}`; otherwise the trimmed reply unchanged.
#[must_use]
pub fn extract_json_from_response(response: &str) -> &str {
    let trimmed = response.trim();

    let fenced = trimmed
        .split_once("```json")
        .and_then(|(_, rest)| rest.split_once("```"))
        .map(|(body, _)| body.trim());
    if let Some(body) = fenced {
        return body;
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_raw() {
        let response = r#"{"label": "CORRECT"}"#;
        assert_eq!(extract_json_from_response(response), response);
    }

    #[test]
    fn test_extract_json_markdown() {
        let response = "```json\n{\"label\": \"WRONG\"}\n```";
        assert_eq!(extract_json_from_response(response), r#"{"label": "WRONG"}"#);
    }

    #[test]
    fn test_extract_json_with_prefix() {
        let response = "Here is the result: {\"label\": \"CORRECT\"} hope this helps";
        assert_eq!(extract_json_from_response(response), r#"{"label": "CORRECT"}"#);
    }

    #[test]
    fn test_extract_json_without_object() {
        assert_eq!(extract_json_from_response("  CORRECT "), "CORRECT");
    }

    #[test]
    fn test_http_config_defaults() {
        let config = LlmHttpConfig::default();
        assert_eq!(config.timeout_ms, 30_000);
        assert_eq!(config.connect_timeout_ms, 3_000);
    }
}
