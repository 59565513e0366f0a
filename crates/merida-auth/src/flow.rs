//! Login flow state machine.
//!
//! Type-safe rendition of a single login attempt. Each state is a distinct
//! type, so the session manager cannot answer a challenge that was never
//! issued or report success without a session.

use std::marker::PhantomData;

use uuid::Uuid;

use crate::attributes::{self, Attributes};
use crate::error::{AuthError, AuthResult};
use crate::gateway::SignInOutcome;
use crate::session::{PendingChallenge, Session};

/// Login flow states.
pub mod states {
    /// No attempt started.
    #[derive(Debug, Clone, Copy)]
    pub struct Anonymous;

    /// A provider call is in flight.
    #[derive(Debug, Clone, Copy)]
    pub struct Authenticating;

    /// Waiting for the answer to a challenge.
    #[derive(Debug, Clone, Copy)]
    pub struct ChallengePending;

    /// Attempt succeeded.
    #[derive(Debug, Clone, Copy)]
    pub struct Authenticated;

    /// Attempt failed.
    #[derive(Debug, Clone, Copy)]
    pub struct Failed;
}

/// One login attempt.
///
/// The generic parameter `S` is the current state.
#[derive(Debug)]
pub struct LoginFlow<S> {
    /// Attempt identifier, used to correlate log lines.
    pub attempt_id: Uuid,
    /// Login identifier.
    username: String,
    /// Challenge (pending state only).
    challenge: Option<PendingChallenge>,
    /// Session (authenticated state only).
    session: Option<Session>,
    /// Failure reason (failed state only).
    error: Option<String>,
    _state: PhantomData<S>,
}

impl<S> LoginFlow<S> {
    fn into_state<T>(self) -> LoginFlow<T> {
        LoginFlow {
            attempt_id: self.attempt_id,
            username: self.username,
            challenge: None,
            session: None,
            error: None,
            _state: PhantomData,
        }
    }

    /// Gets the login identifier.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl LoginFlow<states::Anonymous> {
    /// Creates a new attempt for `username`.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            attempt_id: Uuid::now_v7(),
            username: username.into(),
            challenge: None,
            session: None,
            error: None,
            _state: PhantomData,
        }
    }

    /// Starts the attempt.
    #[must_use]
    pub fn start(self) -> LoginFlow<states::Authenticating> {
        self.into_state()
    }
}

impl LoginFlow<states::Authenticating> {
    /// Applies the provider's verdict.
    #[must_use]
    pub fn resolve(self, outcome: SignInOutcome) -> AttemptResult {
        match outcome {
            SignInOutcome::Success(session) => {
                let mut flow: LoginFlow<states::Authenticated> = self.into_state();
                flow.session = Some(session);
                AttemptResult::Authenticated(flow)
            }
            SignInOutcome::ChallengeRequired(mut challenge) => {
                challenge.attempt_id = self.attempt_id;
                let mut flow: LoginFlow<states::ChallengePending> = self.into_state();
                flow.challenge = Some(challenge);
                AttemptResult::Challenged(flow)
            }
            SignInOutcome::Failure(error) => {
                let mut flow: LoginFlow<states::Failed> = self.into_state();
                flow.error = Some(error.to_string());
                AttemptResult::Failed(flow, error)
            }
        }
    }
}

impl LoginFlow<states::ChallengePending> {
    /// Resumes an attempt from a stored challenge.
    #[must_use]
    pub fn from_pending(challenge: PendingChallenge) -> Self {
        Self {
            attempt_id: challenge.attempt_id,
            username: challenge.username.clone(),
            challenge: Some(challenge),
            session: None,
            error: None,
            _state: PhantomData,
        }
    }

    /// Gets the pending challenge.
    #[must_use]
    pub const fn challenge(&self) -> Option<&PendingChallenge> {
        self.challenge.as_ref()
    }

    /// Back-fills and validates the attributes for the answer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ChallengeValidation` listing attributes that are
    /// still missing, and `AuthError::InvalidPassword` for an empty password.
    pub fn prepare_answer(&self, new_password: &str, supplied: &Attributes) -> AuthResult<Attributes> {
        if new_password.is_empty() {
            return Err(AuthError::InvalidPassword("new password is required".to_string()));
        }
        let challenge = self.challenge().ok_or(AuthError::InvalidState)?;
        let seeded = attributes::adopt_existing(
            &challenge.required_attributes,
            &challenge.existing_attributes,
            supplied,
        );
        let resolved = attributes::backfill(&challenge.required_attributes, &self.username, &seeded);
        let missing = attributes::missing_attributes(&challenge.required_attributes, &resolved);
        if missing.is_empty() {
            Ok(resolved)
        } else {
            Err(AuthError::ChallengeValidation { missing })
        }
    }

    /// Sends the answer, returning the in-flight flow and the challenge it answers.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidState` if no challenge is set.
    pub fn answer(mut self) -> AuthResult<(LoginFlow<states::Authenticating>, PendingChallenge)> {
        let challenge = self.challenge.take().ok_or(AuthError::InvalidState)?;
        Ok((self.into_state(), challenge))
    }

    /// Releases the challenge for storage.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidState` if no challenge is set.
    pub fn into_challenge(mut self) -> AuthResult<PendingChallenge> {
        self.challenge.take().ok_or(AuthError::InvalidState)
    }
}

impl LoginFlow<states::Authenticated> {
    /// Gets the established session.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Converts to the established session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAuthenticated` if no session is set.
    pub fn into_session(self) -> AuthResult<Session> {
        self.session.ok_or(AuthError::NotAuthenticated)
    }
}

impl LoginFlow<states::Failed> {
    /// Gets the failure reason.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Result of resolving an attempt.
#[derive(Debug)]
pub enum AttemptResult {
    /// Session established.
    Authenticated(LoginFlow<states::Authenticated>),
    /// The user must answer a challenge.
    Challenged(LoginFlow<states::ChallengePending>),
    /// The attempt failed.
    Failed(LoginFlow<states::Failed>, AuthError),
}
