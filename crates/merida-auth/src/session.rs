//! Session model and state.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attributes::Attributes;
use crate::provider::{ChallengeKind, ProviderChallenge, UserProfile};

/// How long the provider honors a challenge session.
pub const CHALLENGE_LIFETIME_SECS: i64 = 180;

/// An authenticated user session.
///
/// Exists only while the identity provider holds a valid session for the
/// user; created by sign-in or by the start-up session restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Stable user identifier.
    pub user_id: String,
    /// Pool username.
    pub username: String,
    /// Email address, if known.
    pub email: Option<String>,
    /// Always `true` for a live session.
    pub is_authenticated: bool,
    /// When the session was established or last confirmed.
    pub authenticated_at: DateTime<Utc>,
}

impl Session {
    /// Builds a session from a user profile.
    #[must_use]
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            user_id: profile.user_id().to_string(),
            username: profile.username.clone(),
            email: profile.email().map(str::to_string),
            is_authenticated: true,
            authenticated_at: Utc::now(),
        }
    }
}

/// A challenge awaiting an answer from the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChallenge {
    /// Login attempt that produced the challenge.
    pub attempt_id: Uuid,
    /// Challenge kind.
    pub kind: ChallengeKind,
    /// Login identifier used for the attempt.
    pub username: String,
    /// Opaque provider handle.
    pub provider_session: String,
    /// Attributes that must accompany the answer.
    pub required_attributes: BTreeSet<String>,
    /// Attributes already on the account.
    pub existing_attributes: Attributes,
    /// When the challenge was issued.
    pub issued_at: DateTime<Utc>,
}

impl PendingChallenge {
    /// Wraps a provider challenge.
    #[must_use]
    pub fn new(attempt_id: Uuid, username: &str, challenge: ProviderChallenge) -> Self {
        Self {
            attempt_id,
            kind: challenge.kind,
            username: username.to_string(),
            provider_session: challenge.session,
            required_attributes: challenge.required_attributes,
            existing_attributes: challenge.existing_attributes,
            issued_at: Utc::now(),
        }
    }

    /// Checks if the provider will still accept an answer.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() - self.issued_at > Duration::seconds(CHALLENGE_LIFETIME_SECS)
    }

    /// Checks if this challenge belongs to `username`.
    #[must_use]
    pub fn is_for(&self, username: &str) -> bool {
        self.username == username
    }
}

/// What the caller must do after a login call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoginChallenge {
    /// A new password must be supplied before the login can complete.
    pub requires_new_password: bool,
    /// Profile attributes the provider demands with the new password.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_attributes: Vec<String>,
}

impl LoginChallenge {
    /// Login completed; nothing more required.
    #[must_use]
    pub fn completed() -> Self {
        Self::default()
    }

    /// A new password (and possibly attributes) is required.
    #[must_use]
    pub fn new_password(required: &BTreeSet<String>) -> Self {
        Self {
            requires_new_password: true,
            required_attributes: required.iter().cloned().collect(),
        }
    }
}

/// State of the session state machine.
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    /// No session.
    #[default]
    Anonymous,
    /// A provider call is in flight.
    Authenticating,
    /// Waiting for the user to answer a challenge.
    ChallengePending(PendingChallenge),
    /// A session is active.
    Authenticated(Session),
    /// The last attempt failed; transient before returning to `Anonymous`.
    Failed(String),
}

impl SessionState {
    /// Returns the state name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Authenticating => "authenticating",
            Self::ChallengePending(_) => "challenge_pending",
            Self::Authenticated(_) => "authenticated",
            Self::Failed(_) => "failed",
        }
    }

    /// Checks if a session is active.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// Returns the active session.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}
