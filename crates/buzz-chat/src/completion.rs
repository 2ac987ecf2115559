//! Client for the hosted chat-completion service.
//!
//! [`CompletionClient`] is the seam the controller talks to. [`GroqClient`]
//! speaks the OpenAI-compatible `/chat/completions` protocol that Groq
//! exposes. One client is built at startup and shared by reference across
//! every session.

use std::time::Duration;

use async_trait::async_trait;
use buzz_core::config::CompletionConfig;
use buzz_core::types::Message;
use buzz_core::BuzzError;
use serde::{Deserialize, Serialize};

use crate::error::CompletionError;

/// A text-completion backend.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send `messages` and return the first generated response's text.
    async fn complete(&self, messages: &[Message]) -> Result<String, CompletionError>;

    /// Model identifier sent with every request.
    fn model(&self) -> &str;
}

/// Groq chat-completions client.
pub struct GroqClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl std::fmt::Debug for GroqClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqClient")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl GroqClient {
    /// Build a client, reading the API key from the environment variable
    /// named in `config`. Fails with [`CompletionError::Auth`] if it is unset.
    pub fn from_config(config: &CompletionConfig) -> Result<Self, CompletionError> {
        let api_key = config.resolve_api_key().map_err(|e| match e {
            BuzzError::MissingCredential(var) => CompletionError::Auth(var),
            other => CompletionError::Auth(other.to_string()),
        })?;
        Self::with_api_key(config, api_key)
    }

    /// Build a client with an explicit API key.
    pub fn with_api_key(
        config: &CompletionConfig,
        api_key: impl Into<String>,
    ) -> Result<Self, CompletionError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(CompletionError::Auth(config.api_key_env.clone()));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            api_key,
            model: config.model.clone(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[async_trait]
impl CompletionClient for GroqClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, CompletionError> {
        let body = CompletionRequest {
            model: &self.model,
            messages,
        };

        tracing::debug!(
            model = %self.model,
            message_count = messages.len(),
            "Sending completion request"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ApiErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(CompletionError::Upstream(format!(
                "completion service returned {}: {}",
                status, detail
            )));
        }

        let parsed: CompletionResponse = serde_json::from_str(&text).map_err(|e| {
            CompletionError::Upstream(format!("failed to parse completion response: {}", e))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::Upstream("completion response had no choices".into()))?
            .message
            .content
            .ok_or_else(|| {
                CompletionError::Upstream("completion response had no message content".into())
            })
    }

    fn model(&self) -> &str {
        &self.model
    }
}
