use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AgoraError, Result};

/// Top-level configuration for the assistant engine.
///
/// Loaded from a TOML file. Each section corresponds to one subsystem. The
/// tuning constants here (confidence thresholds, the short-input guard, the
/// debounce interval) are deliberately preserved from the production values
/// rather than re-derived; change them only with measurement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub chat: ChatConfig,
    pub routing: RoutingConfig,
    pub llm: LlmConfig,
    pub persistence: PersistenceConfig,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            chat: ChatConfig::default(),
            routing: RoutingConfig::default(),
            llm: LlmConfig::default(),
            persistence: PersistenceConfig::default(),
        }
    }
}

impl AssistantConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AssistantConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration, falling back to defaults if the file is missing
    /// or unparseable.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AgoraError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// Conversation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Whether the assistant is enabled at all.
    pub enabled: bool,
    /// Maximum messages retained per conversation; oldest are discarded.
    pub max_messages: usize,
    /// Maximum accepted utterance length in characters.
    pub max_message_chars: usize,
    /// Confidence reported for the unknown-intent fallback.
    pub unknown_confidence: f32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_messages: 100,
            max_message_chars: 2000,
            unknown_confidence: 0.3,
        }
    }
}

/// Rule-vs-LLM routing thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Below this classification confidence, the turn is routed to the LLM.
    pub confidence_threshold: f32,
    /// Utterances shorter than this many characters are routed to the LLM.
    pub short_input_chars: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            short_input_chars: 10,
        }
    }
}

/// Remote chat-completion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Whether the LLM fallback path is available.
    pub enabled: bool,
    /// Base URL of the chat-completion API (no trailing slash).
    pub endpoint: String,
    /// Bearer token. Empty means unauthenticated (local gateway).
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Hard per-request timeout, independent of retry count.
    pub timeout_secs: u64,
    /// Maximum attempts per turn, including the first.
    pub max_attempts: u32,
    /// Base delay for backoff computation.
    pub backoff_base_ms: u64,
    /// Fixed provenance confidence attached to model-generated replies.
    pub response_confidence: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 400,
            timeout_secs: 30,
            max_attempts: 3,
            backoff_base_ms: 1000,
            response_confidence: 0.75,
        }
    }
}

/// Durable context write coalescing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Debounce interval for durable writes. Each mutation resets the timer;
    /// callers must tolerate up to one interval of durability lag.
    pub debounce_ms: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self { debounce_ms: 2000 }
    }
}
