//! Turn orchestration for the Agora assistant.
//!
//! Ties the pipeline together: classify the utterance, enrich it against the
//! user's context and any active workflow, route it to the rule templates or
//! the LLM fallback, resolve the platform action, and persist the turn. The
//! [`Orchestrator`] is the only entry point the host application needs.

pub mod dispatch;
pub mod error;
pub mod orchestrator;
pub mod response;
pub mod types;

pub use dispatch::ActionDispatcher;
pub use error::ChatError;
pub use orchestrator::{
    ActionSink, FeedbackSink, NoopActionSink, NoopFeedbackSink, Orchestrator,
};
pub use response::ResponseGenerator;
pub use types::Enrichment;
