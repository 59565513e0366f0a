//! Client configuration.
//!
//! Configuration is loaded from environment variables with sensible defaults.
//! Only the identity-provider pool and client identifiers are mandatory.

use std::time::Duration;

use crate::error::{Error, Result};

/// Default identity-provider region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default REST backend URL.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Complete client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Identity provider settings.
    pub auth: AuthConfig,
    /// REST backend settings.
    pub api: ApiConfig,
    /// Query cache settings.
    pub query: QueryConfig,
    /// Application metadata.
    pub app: AppConfig,
}

/// Hosted identity provider (user pool) settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// User pool identifier (e.g. `us-east-1_AbCdEf123`).
    pub user_pool_id: String,
    /// App client identifier.
    pub client_id: String,
    /// Region hosting the pool.
    pub region: String,
    /// Endpoint override, used by local emulators and tests.
    pub endpoint: Option<String>,
    /// Timeout of each provider call.
    pub timeout: Duration,
}

impl AuthConfig {
    /// Returns the provider endpoint, honoring the override.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| format!("https://cognito-idp.{}.amazonaws.com/", self.region))
    }
}

/// REST backend settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the backend, without trailing slash.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

/// Query cache settings.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// How long a fetched value is served without refetching.
    pub stale_time: Duration,
    /// Interval for background refresh of live plot state.
    pub poll_interval: Duration,
    /// Number of retries after a failed fetch.
    pub retries: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(5 * 60),
            poll_interval: Duration::from_secs(30),
            retries: 1,
        }
    }
}

/// Application metadata.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Display name.
    pub name: String,
    /// Version string.
    pub version: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "MERIDA Smart Grow".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// A `.env` file in the working directory is read first if present.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a numeric
    /// variable cannot be parsed or is zero.
    pub fn from_env() -> Result<Self> {
        if dotenvy::dotenv().is_ok() {
            tracing::debug!("loaded .env file");
        }
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_env`].
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let user_pool_id =
            var("MERIDA_COGNITO_USER_POOL_ID").ok_or_else(|| Error::missing("MERIDA_COGNITO_USER_POOL_ID"))?;
        let client_id =
            var("MERIDA_COGNITO_CLIENT_ID").ok_or_else(|| Error::missing("MERIDA_COGNITO_CLIENT_ID"))?;
        let region = var("MERIDA_AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string());
        let endpoint = var("MERIDA_COGNITO_ENDPOINT");

        let base_url = var("MERIDA_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let timeout_ms = parse_nonzero("MERIDA_API_TIMEOUT_MS", var("MERIDA_API_TIMEOUT_MS"), 30_000)?;
        let auth_timeout_ms = parse_nonzero(
            "MERIDA_COGNITO_TIMEOUT_MS",
            var("MERIDA_COGNITO_TIMEOUT_MS"),
            30_000,
        )?;

        let defaults = QueryConfig::default();
        let stale_secs = parse_nonzero(
            "MERIDA_STALE_TIME_SECS",
            var("MERIDA_STALE_TIME_SECS"),
            defaults.stale_time.as_secs(),
        )?;
        let poll_secs = parse_nonzero(
            "MERIDA_POLL_INTERVAL_SECS",
            var("MERIDA_POLL_INTERVAL_SECS"),
            defaults.poll_interval.as_secs(),
        )?;

        let mut app = AppConfig::default();
        if let Some(name) = var("MERIDA_APP_NAME") {
            app.name = name;
        }

        Ok(Self {
            auth: AuthConfig {
                user_pool_id,
                client_id,
                region,
                endpoint,
                timeout: Duration::from_millis(auth_timeout_ms),
            },
            api: ApiConfig {
                base_url,
                timeout: Duration::from_millis(timeout_ms),
            },
            query: QueryConfig {
                stale_time: Duration::from_secs(stale_secs),
                poll_interval: Duration::from_secs(poll_secs),
                retries: defaults.retries,
            },
            app,
        })
    }

    /// Creates a configuration pointing at local fake servers.
    #[must_use]
    pub fn for_testing(identity_endpoint: &str, api_base_url: &str) -> Self {
        Self {
            auth: AuthConfig {
                user_pool_id: "us-east-1_TestPool".to_string(),
                client_id: "test-client".to_string(),
                region: DEFAULT_REGION.to_string(),
                endpoint: Some(identity_endpoint.to_string()),
                timeout: Duration::from_secs(5),
            },
            api: ApiConfig {
                base_url: api_base_url.trim_end_matches('/').to_string(),
                timeout: Duration::from_secs(5),
            },
            query: QueryConfig::default(),
            app: AppConfig::default(),
        }
    }
}

fn parse_nonzero(name: &str, value: Option<String>, default: u64) -> Result<u64> {
    let Some(raw) = value else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(Error::InvalidValue {
            name: name.to_string(),
            value: raw,
        }),
    }
}
