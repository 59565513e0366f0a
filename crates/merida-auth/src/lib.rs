//! # merida-auth
//!
//! Authentication for the MERIDA Smart Grow client.
//!
//! This crate wraps a hosted user-pool identity provider and exposes the
//! session state machine the rest of the client depends on.
//!
//! ## Layers
//!
//! - [`IdentityProvider`]: the raw provider operations. [`CognitoProvider`]
//!   speaks the Cognito user-pool JSON protocol.
//! - [`IdentityGateway`]: session lookup, credential cache purge, sign-in,
//!   challenge confirmation and sign-out on top of a provider and a pair of
//!   [`CredentialStore`]s.
//! - [`SessionManager`]: the `Anonymous → Authenticating → ChallengePending →
//!   Authenticated` state machine, including the new-password challenge and
//!   attribute back-fill.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use merida_auth::{CognitoProvider, IdentityGateway, MemoryStore, SessionManager};
//!
//! let provider = CognitoProvider::new(&config.auth)?;
//! let gateway = IdentityGateway::new(
//!     provider,
//!     &config.auth.client_id,
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(MemoryStore::new()),
//! );
//! let manager = SessionManager::new(gateway);
//! manager.restore_session().await;
//!
//! let challenge = manager.login("grower@example.com", "secret", None, None).await?;
//! if challenge.requires_new_password {
//!     manager.login("grower@example.com", "secret", Some("n3w-Secret"), None).await?;
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod attributes;
pub mod claims;
pub mod cognito;
pub mod error;
pub mod flow;
pub mod gateway;
pub mod manager;
pub mod provider;
pub mod session;
pub mod store;


pub use attributes::{adopt_existing, backfill, missing_attributes, Attributes};
pub use cognito::CognitoProvider;
pub use error::{AuthError, AuthResult};
pub use flow::{states, AttemptResult, LoginFlow};
pub use gateway::{IdentityGateway, SignInOutcome, TokenStorage};
pub use manager::SessionManager;
pub use provider::{ChallengeKind, IdentityProvider, ProviderChallenge, ProviderResponse, TokenSet, UserProfile};
pub use session::{LoginChallenge, PendingChallenge, Session, SessionState};
pub use store::{CredentialStore, FileStore, MemoryStore, PROVIDER_PREFIX};
