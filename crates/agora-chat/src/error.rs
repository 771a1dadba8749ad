use thiserror::Error;

/// Turn-level failures surfaced to the host application.
///
/// Everything else in the pipeline degrades instead of failing: an LLM
/// outage falls back to rule templates, a storage error starts a fresh
/// context.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChatError {
    #[error("assistant is disabled")]
    Disabled,

    #[error("empty message")]
    EmptyMessage,

    #[error("message exceeds {max} characters")]
    MessageTooLong { max: usize },
}
