use thiserror::Error;

/// Top-level error type for the Agora assistant engine.
///
/// Each variant wraps a subsystem-specific failure. Subsystem crates convert
/// into this type so the `?` operator works across crate boundaries. None of
/// these errors is ever shown to the end user: every caller has a defined
/// degrade-gracefully path (rule fallback, in-memory context, unknown-intent
/// template).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AgoraError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Context error: {0}")]
    Context(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Dispatch error: {0}")]
    Dispatch(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for AgoraError {
    fn from(err: toml::de::Error) -> Self {
        AgoraError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for AgoraError {
    fn from(err: toml::ser::Error) -> Self {
        AgoraError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AgoraError {
    fn from(err: serde_json::Error) -> Self {
        AgoraError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Agora operations.
pub type Result<T> = std::result::Result<T, AgoraError>;
