//! HTTP client for OpenAI-compatible chat-completion APIs.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use agora_core::{AgoraError, LlmConfig};

use crate::retry::LlmErrorKind;

/// One failed call attempt, classified for the retry policy.
#[derive(Debug, Error)]
#[error("llm call failed ({kind:?}): {message}")]
pub struct LlmCallError {
    pub kind: LlmErrorKind,
    pub message: String,
}

impl LlmCallError {
    fn new(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// One message in the chat-completion wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    pub role: String,
    pub content: String,
}

impl ApiMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ApiMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Thin wrapper over `POST {endpoint}/chat/completions` with a hard
/// per-request timeout baked into the underlying client.
pub struct LlmClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl LlmClient {
    pub fn new(config: &LlmConfig) -> Result<Self, AgoraError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgoraError::Llm(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    /// Run one completion attempt and return the generated text.
    pub async fn complete(&self, messages: &[ApiMessage]) -> Result<String, LlmCallError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        };

        let mut request = self.http.post(&url).json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request.send().await.map_err(|e| {
            let kind = if e.is_timeout() {
                LlmErrorKind::Timeout
            } else {
                LlmErrorKind::Server
            };
            LlmCallError::new(kind, e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmCallError::new(
                LlmErrorKind::from_status(status.as_u16()),
                format!("status {}: {}", status, truncate(&body, 200)),
            ));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            LlmCallError::new(LlmErrorKind::Terminal, format!("malformed response: {}", e))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| LlmCallError::new(LlmErrorKind::Terminal, "empty completion"))?;

        debug!(chars = content.len(), "llm completion received");
        Ok(content)
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// =============================================================================
// Tests
// =============================================================================
