//! LLM fallback for turns the rule engine cannot answer well.
//!
//! The service wraps a chat-completion HTTP API with a hard per-request
//! timeout and a bounded retry loop. It is strictly optional: every public
//! entry point degrades to `None` on failure so the caller can fall back to
//! rule-generated responses, and a disabled or misconfigured client behaves
//! like a permanently failing one.

pub mod client;
pub mod prompt;
pub mod retry;
pub mod service;

pub use client::{ApiMessage, LlmCallError, LlmClient};
pub use prompt::{build_history, build_system_prompt};
pub use retry::{LlmErrorKind, RetryPolicy};
pub use service::{should_use_llm, FallbackService};
