//! Rule-vs-LLM routing and the retrying fallback service.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, warn};

use agora_core::{
    ActionDescriptor, BotResponse, Intent, LlmConfig, NlpResult, ResponseSource, RoutingConfig,
};

use crate::client::{ApiMessage, LlmClient};
use crate::retry::RetryPolicy;

/// Bare arithmetic like "1+1" or "2 * 3 =". Rules have nothing to say about
/// these; the model does.
static ARITHMETIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\d+(?:\s*[-+*/^]\s*\d+)+\s*=?\s*$").expect("Invalid arithmetic regex")
});

/// Decide whether this turn goes to the LLM instead of the rule templates.
///
/// Checks run in priority order: an active workflow always consults the
/// model (it gets the checklist in its prompt and phrases the next question
/// with full context); inputs too short or purely arithmetic carry no
/// rule-matchable signal and go to the model; so does anything the
/// classifier is unsure about.
pub fn should_use_llm(
    nlp: &NlpResult,
    workflow_active: bool,
    input: &str,
    routing: &RoutingConfig,
) -> bool {
    if workflow_active {
        return true;
    }
    let trimmed = input.trim();
    if trimmed.chars().count() < routing.short_input_chars || ARITHMETIC_RE.is_match(trimmed) {
        return true;
    }
    nlp.intent == Intent::Unknown || nlp.confidence < routing.confidence_threshold
}

/// LLM fallback with bounded retries.
///
/// `generate` returns `None` on any unrecoverable outcome; the caller is
/// expected to answer with a rule template instead. A disabled configuration
/// simply produces a service that always returns `None`.
pub struct FallbackService {
    client: Option<LlmClient>,
    policy: RetryPolicy,
    response_confidence: f32,
}

impl FallbackService {
    pub fn new(config: &LlmConfig) -> Self {
        let client = if config.enabled {
            match LlmClient::new(config) {
                Ok(client) => Some(client),
                Err(e) => {
                    warn!("LLM client unavailable: {}. Falling back to rules only.", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            client,
            policy: RetryPolicy::new(
                config.max_attempts,
                Duration::from_millis(config.backoff_base_ms),
            ),
            response_confidence: config.response_confidence,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Generate a model response, retrying per the policy.
    pub async fn generate(&self, messages: &[ApiMessage]) -> Option<BotResponse> {
        let client = self.client.as_ref()?;

        let mut attempt = 1u32;
        loop {
            match client.complete(messages).await {
                Ok(text) => {
                    return Some(BotResponse {
                        text,
                        suggestions: Vec::new(),
                        action: ActionDescriptor::None,
                        source: ResponseSource::Llm,
                        confidence: self.response_confidence,
                    });
                }
                Err(e) => match self.policy.next_delay(e.kind, attempt) {
                    Some(delay) => {
                        debug!(attempt, ?delay, "llm attempt failed, retrying: {}", e);
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => {
                        warn!("llm fallback gave up after attempt {}: {}", attempt, e);
                        return None;
                    }
                },
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
