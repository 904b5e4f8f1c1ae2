//! Model client adapter for Textlens
//!
//! Provides a `TextAnalyzer` trait so the rest of the service only ever sees
//! the structured [`Analysis`] triple, never the raw completion shape, plus
//! `OpenAiAnalyzer`, an implementation backed by an OpenAI-compatible
//! chat-completions endpoint.
//!
//! One prompt, one bounded call, no retry and no fallback: any failure is
//! returned to the caller as-is.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ModelConfig, TextlensConfig};
use crate::error::TextlensError;
use crate::models::Analysis;
use crate::parse::parse_completion;

const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

// ============================================================================
// TextAnalyzer trait
// ============================================================================

/// Abstraction over the external text-understanding service.
#[async_trait]
pub trait TextAnalyzer: Send + Sync {
    /// Produce a summary, keyword list and sentiment label for `text`.
    async fn analyze(&self, text: &str) -> Result<Analysis, AnalyzerError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

// ============================================================================
// Error types
// ============================================================================

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model call timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Model returned an empty completion")]
    EmptyCompletion,

    #[error("Unparseable completion: {0}")]
    Parse(String),

    #[error("Missing API key")]
    MissingApiKey,
}

// ============================================================================
// Chat-completions API structs (private)
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Build the user message asking for all three fields in one reply.
pub fn build_prompt(text: &str) -> String {
    format!(
        "Analyze the following text.\n\
         1. Summarize it in 2-3 sentences.\n\
         2. Extract the main keywords.\n\
         3. Classify the sentiment as Positive, Negative, or Neutral.\n\n\
         Respond with only a JSON object of the form \
         {{\"summary\": string, \"keywords\": [string], \"sentiment\": string}}.\n\n\
         Text:\n{}",
        text
    )
}

// ============================================================================
// OpenAiAnalyzer
// ============================================================================

/// Chat-completions client: `POST {base_url}/chat/completions` with bearer auth.
#[derive(Clone)]
pub struct OpenAiAnalyzer {
    client: Client,
    config: ModelConfig,
    api_key: String,
    base_url: String,
}

// Hand-written so the key never reaches a log line.
impl std::fmt::Debug for OpenAiAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiAnalyzer")
            .field("config", &self.config)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OpenAiAnalyzer {
    pub fn new(config: ModelConfig, api_key: String) -> Result<Self, AnalyzerError> {
        let base_url = config.base_url.clone();
        Self::with_base_url(config, api_key, base_url)
    }

    /// Build from the full service config, resolving the key from the environment.
    pub fn from_config(config: &TextlensConfig) -> Result<Self, TextlensError> {
        let api_key = config.api_key()?;
        Ok(Self::new(config.model.clone(), api_key)?)
    }

    /// Create a client against a custom base URL (tests, compatible gateways).
    pub fn with_base_url(
        config: ModelConfig,
        api_key: String,
        base_url: String,
    ) -> Result<Self, AnalyzerError> {
        if api_key.trim().is_empty() {
            return Err(AnalyzerError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            config,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send one completion request and return the raw reply text.
    pub async fn complete(&self, text: &str) -> Result<String, AnalyzerError> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: build_prompt(text),
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&error_body)
                .ok()
                .and_then(|e| e.error)
                .map(|e| e.message)
                .unwrap_or(error_body);
            let message = self.redact(&message);

            tracing::error!(code = status.as_u16(), message = %message, "Chat completion API error");

            return Err(AnalyzerError::Api {
                code: status.as_u16(),
                message,
            });
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| self.classify(e))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(AnalyzerError::EmptyCompletion)
    }

    /// Upstream error bodies may quote the key back (e.g. "Incorrect API key provided").
    fn redact(&self, message: &str) -> String {
        if self.api_key.is_empty() {
            return message.to_string();
        }
        message.replace(self.api_key.as_str(), "<redacted>")
    }

    fn classify(&self, error: reqwest::Error) -> AnalyzerError {
        if error.is_timeout() {
            AnalyzerError::Timeout {
                seconds: self.config.timeout_seconds,
            }
        } else {
            AnalyzerError::Http(error)
        }
    }
}

#[async_trait]
impl TextAnalyzer for OpenAiAnalyzer {
    async fn analyze(&self, text: &str) -> Result<Analysis, AnalyzerError> {
        let completion = self.complete(text).await?;
        match parse_completion(&completion) {
            Ok(analysis) => Ok(analysis),
            Err(e) => {
                tracing::warn!(error = %e, "Could not extract analysis from completion");
                Err(e)
            }
        }
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// ============================================================================
// TESTS
// ============================================================================
