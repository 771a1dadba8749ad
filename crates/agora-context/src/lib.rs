//! Conversation context: per-user state, guided workflows, and persistence.
//!
//! The [`ContextManager`] is the single writer for a user's conversational
//! state. Reads hand out clones; mutations go through manager methods that
//! update the in-memory cache and schedule a debounced durable write.

pub mod manager;
pub mod persist;
pub mod workflow;

pub use manager::{ContextManager, PlatformContext, UserContext};
pub use persist::{ContextStore, DebouncedWriter, JsonFileStore, MemoryStore};
pub use workflow::{detect_workflow_type, required_fields, submission_key, WorkflowState};
