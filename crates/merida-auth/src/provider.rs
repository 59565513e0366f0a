//! Identity provider trait.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::attributes::{Attributes, EMAIL};
use crate::error::AuthResult;

/// Tokens issued after a successful authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Access token, sent as bearer credential.
    pub access_token: String,
    /// ID token carrying the user's claims.
    pub id_token: Option<String>,
    /// Refresh token.
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    /// Token type (normally `Bearer`).
    pub token_type: String,
}

/// Kind of challenge issued during sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeKind {
    /// The account must set a new password (and possibly profile attributes).
    NewPasswordRequired,
    /// Any challenge this client does not handle (MFA, custom auth, ...).
    Other(String),
}

impl ChallengeKind {
    /// Wire name of the new-password challenge.
    pub const NEW_PASSWORD_REQUIRED: &'static str = "NEW_PASSWORD_REQUIRED";

    /// Parses a provider challenge name.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        if name == Self::NEW_PASSWORD_REQUIRED {
            Self::NewPasswordRequired
        } else {
            Self::Other(name.to_string())
        }
    }

    /// Returns the provider challenge name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::NewPasswordRequired => Self::NEW_PASSWORD_REQUIRED,
            Self::Other(name) => name,
        }
    }
}

/// A challenge as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderChallenge {
    /// Challenge kind.
    pub kind: ChallengeKind,
    /// Opaque handle to send back with the answer.
    pub session: String,
    /// Attributes that must be supplied with the answer.
    pub required_attributes: BTreeSet<String>,
    /// Attributes already on the account.
    pub existing_attributes: Attributes,
}

/// Response to an authentication request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderResponse {
    /// Authentication complete.
    Authenticated(TokenSet),
    /// Further input needed.
    Challenge(ProviderChallenge),
}

/// User profile returned for an access token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserProfile {
    /// Pool username.
    pub username: String,
    /// Profile attributes (`sub`, `email`, ...).
    pub attributes: Attributes,
}

impl UserProfile {
    /// Returns the stable user identifier (`sub`), falling back to the username.
    #[must_use]
    pub fn user_id(&self) -> &str {
        self.attributes
            .get("sub")
            .map_or(self.username.as_str(), String::as_str)
    }

    /// Returns the email attribute, if present.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.attributes.get(EMAIL).map(String::as_str)
    }
}

/// Hosted identity provider.
///
/// Implementations perform one network round trip per call and hold no
/// session state of their own; token caching is the gateway's job.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns the provider ID used in logs.
    fn id(&self) -> &'static str;

    /// Starts a username/password authentication.
    async fn initiate_auth(&self, username: &str, password: &str) -> AuthResult<ProviderResponse>;

    /// Answers a new-password challenge.
    async fn respond_to_new_password_challenge(
        &self,
        username: &str,
        challenge_session: &str,
        new_password: &str,
        attributes: &Attributes,
    ) -> AuthResult<ProviderResponse>;

    /// Looks up the user owning an access token.
    async fn get_user(&self, access_token: &str) -> AuthResult<UserProfile>;

    /// Invalidates every token issued to the user owning `access_token`.
    async fn global_sign_out(&self, access_token: &str) -> AuthResult<()>;
}
