//! Identity gateway.
//!
//! Wraps an [`IdentityProvider`] with the token cache: it persists tokens
//! after sign-in, finds the current session from cached tokens, purges the
//! provider's namespace before each sign-in and tears sessions down.

use std::sync::Arc;

use uuid::Uuid;

use crate::attributes::Attributes;
use crate::claims;
use crate::error::{AuthError, AuthResult};
use crate::provider::{ChallengeKind, IdentityProvider, ProviderResponse, TokenSet, UserProfile};
use crate::session::{PendingChallenge, Session};
use crate::store::{kinds, CredentialStore, TokenKeys, PROVIDER_PREFIX};

/// Outcome of a sign-in or challenge answer.
#[derive(Debug)]
pub enum SignInOutcome {
    /// A session was established and its tokens cached.
    Success(Session),
    /// The provider demands more input.
    ChallengeRequired(PendingChallenge),
    /// The attempt failed.
    Failure(AuthError),
}

impl SignInOutcome {
    /// Checks if this is a success outcome.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Checks if this is a challenge outcome.
    #[must_use]
    pub const fn is_challenge(&self) -> bool {
        matches!(self, Self::ChallengeRequired(_))
    }
}

/// Where fresh tokens are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenStorage {
    /// Persistent store; survives restarts.
    #[default]
    Persistent,
    /// Session store; forgotten with the process.
    SessionOnly,
}

/// Identity gateway over a provider and a pair of credential stores.
pub struct IdentityGateway<P> {
    provider: P,
    keys: TokenKeys,
    local: Arc<dyn CredentialStore>,
    session: Arc<dyn CredentialStore>,
    token_storage: TokenStorage,
}

impl<P> std::fmt::Debug for IdentityGateway<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityGateway")
            .field("client_prefix", &self.keys.client_prefix())
            .field("token_storage", &self.token_storage)
            .finish_non_exhaustive()
    }
}

impl<P: IdentityProvider> IdentityGateway<P> {
    /// Creates a gateway.
    ///
    /// `local` plays the part of persistent storage and `session` of
    /// per-process storage.
    pub fn new(
        provider: P,
        client_id: &str,
        local: Arc<dyn CredentialStore>,
        session: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            provider,
            keys: TokenKeys::new(client_id),
            local,
            session,
            token_storage: TokenStorage::default(),
        }
    }

    /// Sets where fresh tokens are written.
    #[must_use]
    pub const fn with_token_storage(mut self, storage: TokenStorage) -> Self {
        self.token_storage = storage;
        self
    }

    /// Gets the underlying provider.
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    fn token_store(&self) -> &dyn CredentialStore {
        match self.token_storage {
            TokenStorage::Persistent => self.local.as_ref(),
            TokenStorage::SessionOnly => self.session.as_ref(),
        }
    }

    fn lookup(&self, key: &str) -> Option<String> {
        self.session.get(key).or_else(|| self.local.get(key))
    }

    /// Returns the last signed-in username, if tokens are cached.
    #[must_use]
    pub fn cached_user(&self) -> Option<String> {
        self.lookup(&self.keys.last_auth_user())
    }

    /// Returns the cached access token of the last signed-in user.
    #[must_use]
    pub fn cached_access_token(&self) -> Option<String> {
        let username = self.cached_user()?;
        self.lookup(&self.keys.token(&username, kinds::ACCESS_TOKEN))
    }

    /// Looks up the active session.
    ///
    /// Never fails: a missing token or a provider rejection both yield `None`.
    pub async fn get_current_session(&self) -> Option<Session> {
        let token = self.cached_access_token()?;
        match self.provider.get_user(&token).await {
            Ok(profile) => Some(Session::from_profile(&profile)),
            Err(e) => {
                tracing::debug!(error = %e, "session lookup failed");
                None
            }
        }
    }

    /// Deletes every provider-namespaced key from both stores.
    ///
    /// Returns the number of keys removed. Store failures are logged and
    /// skipped.
    pub fn clear_cached_credentials(&self) -> usize {
        [&self.local, &self.session]
            .into_iter()
            .map(|store| {
                store.remove_prefixed(PROVIDER_PREFIX).unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "failed to purge cached credentials");
                    0
                })
            })
            .sum()
    }

    /// Signs in after tearing down any existing session and purging the cache.
    pub async fn sign_in(&self, username: &str, password: &str) -> SignInOutcome {
        if let Some(previous) = self.cached_user() {
            tracing::info!(previous = %previous, "terminating existing session before sign-in");
            self.end_session().await;
        }
        let purged = self.clear_cached_credentials();
        if purged > 0 {
            tracing::debug!(purged, "purged cached credentials");
        }
        self.begin_sign_in(username, password).await
    }

    /// Invokes provider sign-in.
    pub async fn begin_sign_in(&self, username: &str, password: &str) -> SignInOutcome {
        tracing::info!(provider = self.provider.id(), username, "signing in");
        let response = self.provider.initiate_auth(username, password).await;
        self.complete(username, response).await
    }

    /// Answers a pending new-password challenge.
    pub async fn confirm_challenge(
        &self,
        challenge: &PendingChallenge,
        new_password: &str,
        attributes: &Attributes,
    ) -> SignInOutcome {
        if challenge.kind != ChallengeKind::NewPasswordRequired {
            return SignInOutcome::Failure(AuthError::UnsupportedChallenge(
                challenge.kind.name().to_string(),
            ));
        }
        tracing::info!(
            attempt = %challenge.attempt_id,
            username = %challenge.username,
            attributes = ?attributes.keys().collect::<Vec<_>>(),
            "answering new-password challenge"
        );
        let response = self
            .provider
            .respond_to_new_password_challenge(
                &challenge.username,
                &challenge.provider_session,
                new_password,
                attributes,
            )
            .await;
        self.complete(&challenge.username, response).await
    }

    /// Ends the current session.
    ///
    /// Safe to call without a session. A failed remote sign-out is logged and
    /// the cached tokens are removed regardless.
    pub async fn end_session(&self) {
        if let Some(token) = self.cached_access_token() {
            if let Err(e) = self.provider.global_sign_out(&token).await {
                tracing::warn!(error = %e, "remote sign-out failed, clearing local tokens");
            }
        }
        for store in [&self.local, &self.session] {
            if let Err(e) = store.remove_prefixed(self.keys.client_prefix()) {
                tracing::warn!(error = %e, "failed to remove cached tokens");
            }
        }
        tracing::info!("session ended");
    }

    async fn complete(&self, username: &str, response: AuthResult<ProviderResponse>) -> SignInOutcome {
        match response {
            Ok(ProviderResponse::Authenticated(tokens)) => match self.establish(username, &tokens).await {
                Ok(session) => SignInOutcome::Success(session),
                Err(e) => SignInOutcome::Failure(e),
            },
            Ok(ProviderResponse::Challenge(challenge)) => match challenge.kind {
                ChallengeKind::NewPasswordRequired => {
                    SignInOutcome::ChallengeRequired(PendingChallenge::new(Uuid::now_v7(), username, challenge))
                }
                ChallengeKind::Other(name) => {
                    tracing::warn!(challenge = %name, "unsupported challenge");
                    SignInOutcome::Failure(AuthError::UnsupportedChallenge(name))
                }
            },
            Err(e) => SignInOutcome::Failure(e),
        }
    }

    async fn establish(&self, username: &str, tokens: &TokenSet) -> AuthResult<Session> {
        let profile = match tokens.id_token.as_deref().map(claims::decode_id_token) {
            Some(Ok(claims)) => claims.into_profile(username),
            Some(Err(e)) => {
                tracing::debug!(error = %e, "unreadable ID token, asking provider");
                self.provider.get_user(&tokens.access_token).await?
            }
            None => self.provider.get_user(&tokens.access_token).await?,
        };
        self.persist_tokens(&profile, tokens)?;
        Ok(Session::from_profile(&profile))
    }

    fn persist_tokens(&self, profile: &UserProfile, tokens: &TokenSet) -> AuthResult<()> {
        let store = self.token_store();
        let username = profile.username.as_str();
        store.set(&self.keys.token(username, kinds::ACCESS_TOKEN), &tokens.access_token)?;
        if let Some(id_token) = &tokens.id_token {
            store.set(&self.keys.token(username, kinds::ID_TOKEN), id_token)?;
        }
        if let Some(refresh_token) = &tokens.refresh_token {
            store.set(&self.keys.token(username, kinds::REFRESH_TOKEN), refresh_token)?;
        }
        store.set(&self.keys.last_auth_user(), username)
    }
}
