//! Shared types, configuration, and error taxonomy for the Agora
//! conversational assistant engine.
//!
//! Every other crate in the workspace depends on this one; it contains no
//! behavior beyond loading configuration and defining the data model that
//! flows between the NLP engine, context manager, LLM fallback, and
//! orchestrator.

pub mod config;
pub mod error;
pub mod types;

pub use config::{AssistantConfig, ChatConfig, LlmConfig, PersistenceConfig, RoutingConfig};
pub use error::{AgoraError, Result};
pub use types::*;
