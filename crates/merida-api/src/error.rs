//! Data access error types.

use thiserror::Error;

/// Data access error type.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend answered with an error status.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error detail reported by the backend.
        message: String,
    },

    /// The resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request was rejected for lack of a valid session.
    #[error("not authorized: {0}")]
    Unauthorized(String),

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Malformed response body.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// Returns the HTTP status, if the backend answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            Self::Unauthorized(_) => Some(401),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Checks if repeating the request could succeed.
    ///
    /// Client errors (4xx) and request-building errors are final.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::InvalidRequest(_) | Self::Json(_) => false,
            _ => !matches!(self.status(), Some(400..=499)),
        }
    }
}

/// Data access result type.
pub type ApiResult<T> = Result<T, ApiError>;
