//! CLI error types.

use merida_api::ApiError;
use merida_auth::AuthError;
use thiserror::Error;

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error.
    #[error(transparent)]
    Config(#[from] merida_core::Error),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Backend error.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// No session is active.
    #[error("not logged in; run `merida login` first")]
    NotLoggedIn,

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Operation cancelled.
    #[error("operation cancelled")]
    Cancelled,
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;
