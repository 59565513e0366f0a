//! ID token claim extraction.
//!
//! A fresh sign-in builds its session from the ID token rather than a second
//! provider call. Signatures are not verified.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

use crate::error::{AuthError, AuthResult};
use crate::provider::UserProfile;

/// Claims read from an ID token.
#[derive(Debug, Clone, Deserialize)]
pub struct IdClaims {
    /// Subject (stable user id).
    pub sub: String,
    /// Pool username.
    #[serde(rename = "cognito:username")]
    pub username: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Expiration (seconds since epoch).
    pub exp: Option<i64>,
}

impl IdClaims {
    /// Converts the claims into a profile, using `fallback_username` when the
    /// token has no username claim.
    #[must_use]
    pub fn into_profile(self, fallback_username: &str) -> UserProfile {
        let mut profile = UserProfile {
            username: self.username.unwrap_or_else(|| fallback_username.to_string()),
            ..UserProfile::default()
        };
        profile.attributes.insert("sub".to_string(), self.sub);
        if let Some(email) = self.email {
            profile.attributes.insert("email".to_string(), email);
        }
        if let Some(name) = self.name {
            profile.attributes.insert("name".to_string(), name);
        }
        profile
    }
}

/// Decodes the payload of a JWT without verifying it.
///
/// # Errors
///
/// Returns an error if the token is not three dot-separated segments or the
/// payload is not valid base64url JSON.
pub fn decode_id_token(token: &str) -> AuthResult<IdClaims> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(AuthError::SignIn("malformed ID token".to_string())),
    };
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AuthError::SignIn(format!("malformed ID token: {e}")))?;
    Ok(serde_json::from_slice(&bytes)?)
}
