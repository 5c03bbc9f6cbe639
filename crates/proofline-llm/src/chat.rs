//! Chat-completions provider
//!
//! Talks to any backend exposing the OpenAI-style `POST /chat/completions`
//! endpoint. DeepSeek is the default.
//!
//! # Examples
//!
//! ```no_run
//! use proofline_llm::{BackendConfig, ChatProvider};
//!
//! let config = BackendConfig {
//!     api_key: Some("sk-...".to_string()),
//!     ..Default::default()
//! };
//! let provider = ChatProvider::new(config).unwrap();
//! ```

use crate::config::BackendConfig;
use crate::LlmError;
use proofline_domain::traits::LlmProvider;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Provider for OpenAI-compatible chat-completions APIs
pub struct ChatProvider {
    url: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatProvider {
    /// Create a provider from backend settings
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if the settings do not validate and
    /// `Communication` if the HTTP client cannot be built.
    pub fn new(config: BackendConfig) -> Result<Self, LlmError> {
        config.validate().map_err(LlmError::InvalidRequest)?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| LlmError::Communication(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: format!("{}/chat/completions", config.endpoint.trim_end_matches('/')),
            model: config.model,
            api_key: config.api_key,
            client,
        })
    }

    /// Model name sent with each request
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Map a non-success HTTP status to an error
    fn status_error(status: StatusCode, body: String) -> LlmError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::PAYMENT_REQUIRED => {
                LlmError::Authentication(format!("HTTP {}: {}", status.as_u16(), body))
            }
            StatusCode::NOT_FOUND => LlmError::ModelNotAvailable(body),
            StatusCode::REQUEST_TIMEOUT => LlmError::Timeout,
            StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited,
            s if s.is_server_error() => LlmError::Server {
                status: s.as_u16(),
                message: body,
            },
            s => LlmError::InvalidRequest(format!("HTTP {}: {}", s.as_u16(), body)),
        }
    }

    /// Pull the assistant message out of a response body
    fn message_content(response: ChatResponse) -> Result<String, LlmError> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("response has no choices".to_string()))?;

        if choice.finish_reason.as_deref() == Some("content_filter") {
            return Err(LlmError::ContentRejected(
                "backend stopped on its content filter".to_string(),
            ));
        }

        choice
            .message
            .content
            .ok_or_else(|| LlmError::InvalidResponse("choice has no message content".to_string()))
    }
}

impl LlmProvider for ChatProvider {
    type Error = LlmError;

    async fn generate(&self, system: &str, user: &str) -> Result<String, Self::Error> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            stream: false,
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout
            } else {
                LlmError::Communication(format!("Request failed: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Self::status_error(status, text));
        }

        let parsed = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let content = Self::message_content(parsed)?;
        debug!("Backend returned {} chars", content.len());
        Ok(content)
    }
}
