//! Generous LLM judge for generated answers.
//!
//! Each question is graded CORRECT or WRONG by a chat model prompted with the
//! Mem0 LoCoMo "generous" accuracy rubric. A call is retried with linear
//! backoff; unparseable judge output counts as a failed attempt.

use crate::config::JudgeConfig;
use crate::llm::{
    LlmHttpConfig, LlmProvider, OpenAiClient, RetryPolicy, Sleeper, ThreadSleeper,
    extract_json_from_response, retry_with_backoff,
};
use crate::models::{JudgeLabel, JudgeVerdict};
use crate::{Error, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::instrument;

/// Grading rubric. Placeholders: `{question}`, `{gold_answer}`,
/// `{generated_answer}`.
pub const ACCURACY_PROMPT: &str = r#"
Your task is to label an answer to a question as 'CORRECT' or 'WRONG'. You will be given the following data:
    (1) a question (posed by one user to another user),
    (2) a 'gold' (ground truth) answer,
    (3) a generated answer
which you will score as CORRECT/WRONG.

The point of the question is to ask about something one user should know about the other user based on their prior conversations.
The gold answer will usually be a concise and short answer that includes the referenced topic, for example:
Question: Do you remember what I got the last time I went to Hawaii?
Gold answer: A shell necklace
The generated answer might be much longer, but you should be generous with your grading - as long as it touches on the same topic as the gold answer, it should be counted as CORRECT.

For time related questions, the gold answer will be a specific date, month, year, etc. The generated answer might be much longer or use relative time references (like "last Tuesday" or "next month"), but you should be generous with your grading - as long as it refers to the same date or time period as the gold answer, it should be counted as CORRECT. Even if the format differs (e.g., "May 7th" vs "7 May"), consider it CORRECT if it's the same date.

Now it's time for the real question:
Question: {question}
Gold answer: {gold_answer}
Generated answer: {generated_answer}

First, provide a short (one sentence) explanation of your reasoning, then finish with CORRECT or WRONG.
Do NOT include both CORRECT and WRONG in your response, or it will break the evaluation script.

Just return the label CORRECT or WRONG in a json format with the key as "label".
"#;

/// Fills the rubric placeholders in a single pass, so answer text that
/// happens to contain a placeholder is never expanded.
#[must_use]
pub fn build_prompt(question: &str, gold_answer: &str, generated_answer: &str) -> String {
    let substitutions = [
        ("{question}", question),
        ("{gold_answer}", gold_answer),
        ("{generated_answer}", generated_answer),
    ];

    let mut prompt = String::with_capacity(
        ACCURACY_PROMPT.len() + question.len() + gold_answer.len() + generated_answer.len(),
    );
    let mut rest = ACCURACY_PROMPT;
    while let Some(open) = rest.find('{') {
        prompt.push_str(&rest[..open]);
        let tail = &rest[open..];
        match substitutions
            .iter()
            .find(|(placeholder, _)| tail.starts_with(placeholder))
        {
            Some((placeholder, value)) => {
                prompt.push_str(value);
                rest = &tail[placeholder.len()..];
            },
            None => {
                prompt.push('{');
                rest = &tail[1..];
            },
        }
    }
    prompt.push_str(rest);
    prompt
}

/// Parses judge output into a verdict.
///
/// The label is read from the `label` key and matched case-insensitively.
/// Reasoning comes from `reasoning` when present, otherwise the raw content.
///
/// # Errors
///
/// Returns [`Error::MalformedResponse`] if the content is not a JSON object
/// or its label is not `CORRECT` or `WRONG`.
pub fn parse_verdict(content: &str) -> Result<JudgeVerdict> {
    let json = extract_json_from_response(content);
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| Error::MalformedResponse(format!("judge output is not JSON: {e}")))?;

    let raw_label = value
        .get("label")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| Error::MalformedResponse("judge output has no 'label'".to_string()))?;
    let label = JudgeLabel::parse(raw_label).ok_or_else(|| {
        Error::MalformedResponse(format!("unexpected judge label '{raw_label}'"))
    })?;

    let reasoning = value
        .get("reasoning")
        .and_then(serde_json::Value::as_str)
        .unwrap_or(content);

    Ok(JudgeVerdict::new(label, reasoning))
}

/// Grades generated answers against gold answers.
pub struct JudgeClient {
    provider: Arc<dyn LlmProvider>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    model: String,
}

impl JudgeClient {
    /// Creates a judge over an arbitrary provider.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, policy: RetryPolicy) -> Self {
        Self {
            model: provider.name().to_string(),
            provider,
            policy,
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    /// Builds the OpenAI-backed judge from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if no API key is configured.
    pub fn from_config(config: &JudgeConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            Error::Configuration(
                "OPENAI_API_KEY is not set (environment, .env or [judge].api_key)".to_string(),
            )
        })?;

        let client = OpenAiClient::new()
            .with_api_key(api_key)
            .with_endpoint(config.endpoint.clone())
            .with_model(config.model.clone())
            .with_temperature(0.0)
            .with_http_config(LlmHttpConfig::from_config(config));
        let policy = RetryPolicy::new(
            config.max_attempts,
            Duration::from_millis(config.backoff_unit_ms),
        );

        Ok(Self::new(Arc::new(client), policy).with_model(config.model.clone()))
    }

    /// Replaces the sleeper used between attempts.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Sets the model name reported in artifacts.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Model name reported in artifacts.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Retry policy in effect.
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Grades one answer.
    ///
    /// # Errors
    ///
    /// Returns the last attempt's error once every attempt has failed.
    #[instrument(name = "judge.call", skip_all, fields(model = %self.model))]
    pub fn judge(
        &self,
        question: &str,
        gold_answer: &str,
        generated_answer: &str,
    ) -> Result<JudgeVerdict> {
        let prompt = build_prompt(question, gold_answer, generated_answer);

        let result = retry_with_backoff(&self.policy, self.sleeper.as_ref(), "judge", |attempt| {
            if attempt > 1 {
                metrics::counter!("judge_retries_total").increment(1);
            }
            let start = Instant::now();
            let outcome = self
                .provider
                .complete_json(&prompt)
                .and_then(|content| parse_verdict(&content));

            let status = match &outcome {
                Ok(_) => "success",
                Err(Error::MalformedResponse(_)) => "malformed",
                Err(_) => "error",
            };
            metrics::counter!("judge_attempts_total", "status" => status).increment(1);
            metrics::histogram!("judge_request_duration_ms")
                .record(start.elapsed().as_secs_f64() * 1000.0);
            outcome
        });

        match &result {
            Ok(verdict) => tracing::debug!(label = %verdict.label, "Judged"),
            Err(e) => {
                metrics::counter!("judge_failures_total").increment(1);
                tracing::warn!(error = %e, "Judge gave up on question");
            },
        }
        result
    }
}
