//! Error handling module for the bootstrap dispatcher
//!
//! Configuration problems are raised through these types. Delivery failures and
//! handler faults are never raised: they come back as failed `ResultRecord`s.

use thiserror::Error;

/// Main error type for the bootstrap dispatcher
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// IO errors (config files, stdin)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors (missing src, more than one passthrough module)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Flat key=value argument strings that cannot be tokenized
    #[error("Argument decode error: {0}")]
    Decode(String),

    /// The remote temporary directory could not be provisioned
    #[error("Temporary directory error: {0}")]
    TempDir(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for bootstrap operations
pub type Result<T> = std::result::Result<T, BootstrapError>;

// Convenient error constructors
impl BootstrapError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an argument decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a temporary directory error
    pub fn temp_dir(msg: impl Into<String>) -> Self {
        Self::TempDir(msg.into())
    }

    /// Whether this is a caller configuration mistake
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
