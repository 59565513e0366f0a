//! Wiring of configuration, session and query layer for one invocation.

use std::path::PathBuf;
use std::sync::Arc;

use merida_api::{ApiClient, Queries};
use merida_auth::{CognitoProvider, FileStore, IdentityGateway, MemoryStore, Session, SessionManager};
use merida_core::Config;

use crate::cli::Cli;
use crate::config::{default_credentials_path, OutputFormat};
use crate::{CliError, CliResult};

/// Everything a command needs.
pub struct Context {
    /// Loaded configuration.
    pub config: Config,
    /// Session state machine.
    pub session: Arc<SessionManager<CognitoProvider>>,
    /// Cached backend access.
    pub queries: Arc<Queries>,
    /// Output format.
    pub format: OutputFormat,
}

impl Context {
    /// Builds the context from configuration and global flags.
    ///
    /// Persistent tokens live in the credential file; the session store is
    /// in memory for the lifetime of the process.
    pub fn new(mut config: Config, cli: &Cli) -> CliResult<Self> {
        if let Some(url) = &cli.api_url {
            config.api.base_url = url.trim_end_matches('/').to_string();
        }
        let path: PathBuf = match &cli.credentials {
            Some(path) => path.clone(),
            None => default_credentials_path()?,
        };
        tracing::debug!(path = %path.display(), "using credential file");

        let provider = CognitoProvider::new(&config.auth)?;
        let gateway = IdentityGateway::new(
            provider,
            &config.auth.client_id,
            Arc::new(FileStore::open(path)?),
            Arc::new(MemoryStore::new()),
        );
        let session = Arc::new(SessionManager::new(gateway));

        let client = ApiClient::new(&config.api)?.with_token_source(session.clone());
        let queries = Arc::new(Queries::new(client, &config.query));

        Ok(Self {
            config,
            session,
            queries,
            format: cli.output,
        })
    }

    /// Restores the cached session, failing when there is none.
    pub async fn require_session(&self) -> CliResult<Session> {
        self.session.restore_session().await.ok_or(CliError::NotLoggedIn)
    }

    /// Resolves an optional user id to the signed-in user's.
    pub async fn user_or_self(&self, user_id: Option<String>) -> CliResult<String> {
        let session = self.require_session().await?;
        Ok(user_id.unwrap_or(session.user_id))
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("api", &self.config.api.base_url)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}
