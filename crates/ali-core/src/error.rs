//! Error types for the ALI pipeline
//!
//! One taxonomy covers the whole judgment pipeline: configuration problems are
//! fatal, transport failures are absorbed by the judge gateway, invalid answers
//! are retried or propagated by the engines, and filtering/sorting failures are
//! recovered at the pipeline boundary.

use thiserror::Error;

/// Main error type for pipeline operations
#[derive(Error, Debug)]
pub enum AliError {
    /// Malformed policy source, unknown or mistyped judge option, missing model
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Judge unreachable or structurally invalid transport response
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Judge text failed structured extraction or vocabulary validation
    #[error("Invalid answer: {0}")]
    InvalidAnswer(String),

    /// Filtering could not produce a trustworthy result
    #[error("Filtering failed: {0}")]
    FilteringFailure(String),

    /// Sorting exhausted its retry budget on a single comparison
    #[error("Sorting failed after {attempts} invalid answers: {last}")]
    SortingFailure { attempts: u32, last: String },

    /// Caller supplied an unusable argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File access or I/O error
    #[error("File error: {0}")]
    FileError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(String),
}

impl AliError {
    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        AliError::Configuration(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        AliError::Transport(msg.into())
    }

    /// Create an invalid answer error
    pub fn invalid_answer(msg: impl Into<String>) -> Self {
        AliError::InvalidAnswer(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        AliError::InvalidInput(msg.into())
    }

    /// Create a file error
    pub fn file_error(msg: impl Into<String>) -> Self {
        AliError::FileError(msg.into())
    }

    /// Check if this is a user-facing error (vs internal)
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            AliError::Configuration(_) | AliError::InvalidInput(_) | AliError::FileError(_)
        )
    }

    /// Whether the gateway should try the request again
    pub fn is_transient(&self) -> bool {
        matches!(self, AliError::Transport(_))
    }
}

impl From<std::io::Error> for AliError {
    fn from(err: std::io::Error) -> Self {
        AliError::FileError(err.to_string())
    }
}

impl From<serde_json::Error> for AliError {
    fn from(err: serde_json::Error) -> Self {
        AliError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for AliError {
    fn from(err: serde_yaml::Error) -> Self {
        AliError::Serialization(format!("YAML error: {}", err))
    }
}

impl From<toml::de::Error> for AliError {
    fn from(err: toml::de::Error) -> Self {
        AliError::Configuration(format!("TOML error: {}", err))
    }
}

impl From<prometheus::Error> for AliError {
    fn from(err: prometheus::Error) -> Self {
        AliError::Metrics(err.to_string())
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, AliError>;
