//! Error handling shared across the workspace.

use thiserror::Error;

/// Result type alias using the core error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while assembling the client runtime.
#[derive(Debug, Error)]
pub enum Error {
    /// A required setting is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// A setting has a value that cannot be parsed.
    #[error("invalid value for {name}: {value}")]
    InvalidValue {
        /// Environment variable name.
        name: String,
        /// The offending value.
        value: String,
    },
}

impl Error {
    /// Creates a configuration error for a missing variable.
    #[must_use]
    pub fn missing(name: &str) -> Self {
        Self::Config(format!("{name} environment variable is required"))
    }
}
