//! Session manager.
//!
//! Owns the session state and drives the login flow against an
//! [`IdentityGateway`].

use parking_lot::RwLock;

use crate::attributes::Attributes;
use crate::error::{AuthError, AuthResult};
use crate::flow::{states, AttemptResult, LoginFlow};
use crate::gateway::IdentityGateway;
use crate::provider::IdentityProvider;
use crate::session::{LoginChallenge, PendingChallenge, Session, SessionState};

/// Session state machine.
///
/// Concurrent logins are not coordinated; the last one to finish wins.
pub struct SessionManager<P> {
    gateway: IdentityGateway<P>,
    state: RwLock<SessionState>,
}

impl<P> std::fmt::Debug for SessionManager<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("gateway", &self.gateway)
            .field("state", &self.state.read().name())
            .finish()
    }
}

impl<P: IdentityProvider> SessionManager<P> {
    /// Creates a manager in the `Anonymous` state.
    pub fn new(gateway: IdentityGateway<P>) -> Self {
        Self {
            gateway,
            state: RwLock::new(SessionState::Anonymous),
        }
    }

    /// Gets the gateway.
    pub const fn gateway(&self) -> &IdentityGateway<P> {
        &self.gateway
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.state.read().clone()
    }

    /// Returns the active session.
    pub fn session(&self) -> Option<Session> {
        self.state.read().session().cloned()
    }

    /// Checks if a session is active.
    pub fn is_authenticated(&self) -> bool {
        self.state.read().is_authenticated()
    }

    /// Returns the challenge awaiting an answer.
    pub fn pending_challenge(&self) -> Option<PendingChallenge> {
        match &*self.state.read() {
            SessionState::ChallengePending(challenge) => Some(challenge.clone()),
            _ => None,
        }
    }

    /// Returns the bearer token of the active session.
    pub fn access_token(&self) -> Option<String> {
        if self.is_authenticated() {
            self.gateway.cached_access_token()
        } else {
            None
        }
    }

    fn transition(&self, next: SessionState) {
        let mut state = self.state.write();
        tracing::debug!(from = state.name(), to = next.name(), "session state change");
        *state = next;
    }

    fn fail(&self, error: AuthError) -> AuthError {
        tracing::info!(error = %error, "login failed");
        self.transition(SessionState::Failed(error.to_string()));
        self.transition(SessionState::Anonymous);
        error
    }

    /// Checks the cached tokens for a live session.
    ///
    /// Silent: any failure leaves the manager anonymous. A pending challenge
    /// or an in-flight login is left alone.
    pub async fn restore_session(&self) -> Option<Session> {
        let found = self.gateway.get_current_session().await;
        let mut state = self.state.write();
        if matches!(*state, SessionState::ChallengePending(_) | SessionState::Authenticating) {
            return found;
        }
        match &found {
            Some(session) => {
                tracing::debug!(user = %session.username, "restored a cached session");
                *state = SessionState::Authenticated(session.clone());
            }
            None if state.is_authenticated() => {
                tracing::debug!("cached session no longer valid");
                *state = SessionState::Anonymous;
            }
            None => {}
        }
        drop(state);
        found
    }

    /// Logs in.
    ///
    /// Without `new_password`, any existing session is torn down, the
    /// credential cache purged and a sign-in performed; a new-password
    /// challenge is returned to the caller. With `new_password`, a pending
    /// challenge for the same user is answered directly, otherwise the sign-in
    /// is performed and a returned challenge answered in the same call.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ChallengeValidation` when required attributes are
    /// still missing after back-fill (the challenge stays pending), and the
    /// provider's error when sign-in or confirmation fails.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        new_password: Option<&str>,
        attributes: Option<&Attributes>,
    ) -> AuthResult<LoginChallenge> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AuthError::SignIn("username and password are required".to_string()));
        }
        let empty = Attributes::new();
        let supplied = attributes.unwrap_or(&empty);

        if let Some(new_password) = new_password {
            if let Some(pending) = self.reusable_challenge(username) {
                return self
                    .answer(LoginFlow::from_pending(pending), new_password, supplied)
                    .await;
            }
        }

        let flow = LoginFlow::new(username).start();
        tracing::debug!(attempt = %flow.attempt_id, "login attempt started");
        self.transition(SessionState::Authenticating);
        let outcome = self.gateway.sign_in(username, password).await;

        match flow.resolve(outcome) {
            AttemptResult::Authenticated(done) => self.establish(done),
            AttemptResult::Challenged(waiting) => match new_password {
                Some(new_password) => self.answer(waiting, new_password, supplied).await,
                None => self.hold(waiting),
            },
            AttemptResult::Failed(_, error) => Err(self.fail(error)),
        }
    }

    fn reusable_challenge(&self, username: &str) -> Option<PendingChallenge> {
        match &*self.state.read() {
            SessionState::ChallengePending(pending) if pending.is_for(username) => {
                if pending.is_expired() {
                    tracing::debug!(attempt = %pending.attempt_id, "pending challenge expired, signing in again");
                    None
                } else {
                    Some(pending.clone())
                }
            }
            _ => None,
        }
    }

    fn establish(&self, done: LoginFlow<states::Authenticated>) -> AuthResult<LoginChallenge> {
        let session = done.into_session()?;
        tracing::info!(user = %session.username, "logged in");
        self.transition(SessionState::Authenticated(session));
        Ok(LoginChallenge::completed())
    }

    fn hold(&self, waiting: LoginFlow<states::ChallengePending>) -> AuthResult<LoginChallenge> {
        let challenge = waiting.into_challenge()?;
        let result = LoginChallenge::new_password(&challenge.required_attributes);
        tracing::info!(
            attempt = %challenge.attempt_id,
            required = ?result.required_attributes,
            "new password required"
        );
        self.transition(SessionState::ChallengePending(challenge));
        Ok(result)
    }

    async fn answer(
        &self,
        waiting: LoginFlow<states::ChallengePending>,
        new_password: &str,
        supplied: &Attributes,
    ) -> AuthResult<LoginChallenge> {
        let resolved = match waiting.prepare_answer(new_password, supplied) {
            Ok(resolved) => resolved,
            Err(error) => {
                self.hold(waiting)?;
                return Err(error);
            }
        };
        let (in_flight, challenge) = waiting.answer()?;
        self.transition(SessionState::Authenticating);
        let outcome = self
            .gateway
            .confirm_challenge(&challenge, new_password, &resolved)
            .await;

        match in_flight.resolve(outcome) {
            AttemptResult::Authenticated(done) => self.establish(done),
            AttemptResult::Challenged(waiting) => self.hold(waiting),
            AttemptResult::Failed(_, error) => Err(self.fail(error)),
        }
    }

    /// Logs out. Never fails; always ends `Anonymous`.
    pub async fn logout(&self) {
        self.gateway.end_session().await;
        self.transition(SessionState::Anonymous);
    }
}
