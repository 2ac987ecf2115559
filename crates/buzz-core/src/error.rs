use thiserror::Error;

/// Top-level error type for the Buzz service.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for BuzzError` where they cross into the binary, so
/// that the `?` operator works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BuzzError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing credential: environment variable {0} is not set")]
    MissingCredential(String),

    #[error("Chat error: {0}")]
    Chat(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for BuzzError {
    fn from(err: toml::de::Error) -> Self {
        BuzzError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for BuzzError {
    fn from(err: toml::ser::Error) -> Self {
        BuzzError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for BuzzError {
    fn from(err: serde_json::Error) -> Self {
        BuzzError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Buzz operations.
pub type Result<T> = std::result::Result<T, BuzzError>;
