use thiserror::Error;

/// Top-level error type for OlehAssist.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for OlehError` so that `?` works across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OlehError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for OlehError {
    fn from(err: toml::de::Error) -> Self {
        OlehError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for OlehError {
    fn from(err: toml::ser::Error) -> Self {
        OlehError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for OlehError {
    fn from(err: serde_json::Error) -> Self {
        OlehError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for OlehAssist operations.
pub type Result<T> = std::result::Result<T, OlehError>;
