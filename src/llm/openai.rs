//! `OpenAI` client.
//!
//! Talks to any OpenAI-compatible `chat/completions` endpoint.

use super::{LlmHttpConfig, LlmProvider, build_http_client};
use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// `OpenAI` LLM client.
pub struct OpenAiClient {
    /// API key.
    api_key: Option<SecretString>,
    /// API endpoint.
    endpoint: String,
    /// Model to use.
    model: String,
    /// Sampling temperature.
    temperature: f32,
    /// Completion token limit.
    max_tokens: Option<u32>,
    /// HTTP client.
    client: reqwest::blocking::Client,
}

impl OpenAiClient {
    /// Default API endpoint.
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.openai.com/v1";

    /// Default model.
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";

    /// Creates a new `OpenAI` client.
    ///
    /// Picks up `OPENAI_API_KEY` from the environment when present.
    #[must_use]
    pub fn new() -> Self {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .map(SecretString::from);
        Self {
            api_key,
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: None,
            client: build_http_client(LlmHttpConfig::default()),
        }
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: SecretString) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Sets the API endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the completion token limit.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Rebuilds the HTTP client with the given timeouts.
    #[must_use]
    pub fn with_http_config(mut self, config: LlmHttpConfig) -> Self {
        self.client = build_http_client(config);
        self
    }

    /// Returns the configured model.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns true when an API key is configured.
    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Checks if the model is a reasoning-family model.
    ///
    /// These models use `max_completion_tokens` instead of `max_tokens`
    /// and only support the default temperature.
    fn is_reasoning_model(&self) -> bool {
        self.model.starts_with("gpt-5")
            || self.model.starts_with("o1")
            || self.model.starts_with("o3")
    }

    fn build_request(&self, prompt: &str, json_mode: bool) -> ChatCompletionRequest {
        let messages = vec![ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        }];
        let response_format = json_mode.then(|| ResponseFormat {
            kind: "json_object".to_string(),
        });

        if self.is_reasoning_model() {
            ChatCompletionRequest {
                model: self.model.clone(),
                messages,
                max_tokens: None,
                max_completion_tokens: self.max_tokens,
                temperature: None,
                response_format,
            }
        } else {
            ChatCompletionRequest {
                model: self.model.clone(),
                messages,
                max_tokens: self.max_tokens,
                max_completion_tokens: None,
                temperature: Some(self.temperature),
                response_format,
            }
        }
    }

    /// Makes a request to the chat completions API.
    fn request(&self, prompt: &str, json_mode: bool) -> Result<String> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            Error::Configuration("OPENAI_API_KEY not set".to_string())
        })?;

        let request = self.build_request(prompt, json_mode);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(api_key.expose_secret())
            .json(&request)
            .send()
            .map_err(|e| transport_error(&self.model, &e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(Error::OperationFailed {
                operation: "openai_request".to_string(),
                cause: format!("API returned status: {status} - {body}"),
            });
        }

        let response: ChatCompletionResponse = response.json().map_err(|e| {
            if e.is_timeout() {
                transport_error(&self.model, &e)
            } else {
                Error::MalformedResponse(e.to_string())
            }
        })?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::MalformedResponse("No choices in response".to_string()))
    }
}

/// Maps a reqwest failure, naming its kind so retries can tell timeouts apart.
fn transport_error(model: &str, e: &reqwest::Error) -> Error {
    let error_kind = if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connect"
    } else if e.is_request() {
        "request"
    } else {
        "unknown"
    };
    tracing::error!(
        provider = "openai",
        model,
        error = %e,
        error_kind,
        is_timeout = e.is_timeout(),
        is_connect = e.is_connect(),
        "LLM request failed"
    );
    Error::OperationFailed {
        operation: "openai_request".to_string(),
        cause: format!("{error_kind} error: {e}"),
    }
}

impl Default for OpenAiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmProvider for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        self.request(prompt, false)
    }

    fn complete_json(&self, prompt: &str) -> Result<String> {
        self.request(prompt, true)
    }
}

/// Request to the Chat Completions API.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Response from the Chat Completions API.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_configuration() {
        let client = OpenAiClient::new()
            .with_api_key(SecretString::from("test-key"))
            .with_endpoint("https://custom.endpoint/v1/")
            .with_model("gpt-4o")
            .with_max_tokens(150);

        assert_eq!(client.name(), "openai");
        assert!(client.has_api_key());
        assert_eq!(client.endpoint, "https://custom.endpoint/v1");
        assert_eq!(client.model(), "gpt-4o");
        assert_eq!(client.max_tokens, Some(150));
    }

    #[test]
    fn test_json_mode_request_shape() {
        let client = OpenAiClient::new().with_model("gpt-4o-mini");
        let request = client.build_request("grade this", true);
        let value = serde_json::to_value(&request).expect("serialize");

        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["response_format"]["type"], "json_object");
        assert_eq!(value["temperature"], 0.0);
        assert_eq!(value["messages"][0]["role"], "user");
        assert!(value.get("max_completion_tokens").is_none());
    }

    #[test]
    fn test_reasoning_model_request_shape() {
        let client = OpenAiClient::new().with_model("o3-mini").with_max_tokens(64);
        let value = serde_json::to_value(client.build_request("hi", false)).expect("serialize");

        assert!(value.get("temperature").is_none());
        assert!(value.get("response_format").is_none());
        assert_eq!(value["max_completion_tokens"], 64);
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let client = OpenAiClient {
            api_key: None,
            endpoint: OpenAiClient::DEFAULT_ENDPOINT.to_string(),
            model: OpenAiClient::DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: None,
            client: reqwest::blocking::Client::new(),
        };
        assert!(matches!(client.complete("hi"), Err(Error::Configuration(_))));
    }
}
