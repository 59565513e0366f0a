//! Authentication error types.

use thiserror::Error;

/// Errors raised by the identity gateway and session state machine.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Username or password rejected.
    ///
    /// Unknown users map here as well so callers cannot enumerate accounts.
    #[error("incorrect username or password")]
    InvalidCredentials,

    /// The account must reset its password out of band before signing in.
    #[error("password reset required")]
    PasswordResetRequired,

    /// The account exists but has not been confirmed.
    #[error("user is not confirmed")]
    UserNotConfirmed,

    /// The new password does not satisfy the pool's policy.
    #[error("invalid password: {0}")]
    InvalidPassword(String),

    /// Sign-in could not be started or completed.
    #[error("sign-in failed: {0}")]
    SignIn(String),

    /// Required profile attributes are missing after back-fill.
    #[error("missing required attributes: {}", .missing.join(", "))]
    ChallengeValidation {
        /// Attribute names that still have no value.
        missing: Vec<String>,
    },

    /// The provider issued a challenge this client cannot answer.
    #[error("unsupported challenge: {0}")]
    UnsupportedChallenge(String),

    /// The provider's challenge session is no longer valid.
    #[error("challenge session expired")]
    ChallengeExpired,

    /// Operation not valid in the current login state.
    #[error("invalid authentication state")]
    InvalidState,

    /// No authenticated session is available.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Provider-reported error without a more specific mapping.
    #[error("identity provider error: {code}: {message}")]
    Provider {
        /// Provider error code (e.g. `TooManyRequestsException`).
        code: String,
        /// Provider message.
        message: String,
    },

    /// Transport failure talking to the provider.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Malformed provider payload or token.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Credential store failure.
    #[error("credential storage error: {0}")]
    Storage(String),
}

impl AuthError {
    /// Checks if this error should be shown to the user as-is.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::PasswordResetRequired
                | Self::UserNotConfirmed
                | Self::InvalidPassword(_)
                | Self::SignIn(_)
                | Self::ChallengeValidation { .. }
                | Self::ChallengeExpired
        )
    }

    /// Checks if this is a network-level failure.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;
