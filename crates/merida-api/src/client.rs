//! HTTP client for the REST backend.

use std::sync::Arc;

use merida_auth::{IdentityProvider, SessionManager};
use merida_core::ApiConfig;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// Supplies the bearer token attached to each request.
pub trait TokenSource: Send + Sync {
    /// Returns the access token of the active session, if any.
    fn access_token(&self) -> Option<String>;

    /// Identifies whose session the token belongs to.
    fn session_owner(&self) -> Option<String> {
        None
    }
}

impl<P: IdentityProvider> TokenSource for SessionManager<P> {
    fn access_token(&self) -> Option<String> {
        SessionManager::access_token(self)
    }

    fn session_owner(&self) -> Option<String> {
        self.session().map(|session| session.user_id)
    }
}

/// Error body returned by the backend.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// API client for the REST backend.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Option<Arc<dyn TokenSource>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.tokens.is_some())
            .finish()
    }
}

impl ApiClient {
    /// Creates a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(http, &config.base_url))
    }

    /// Creates a client from an existing HTTP client.
    #[must_use]
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens: None,
        }
    }

    /// Attaches a bearer token source.
    #[must_use]
    pub fn with_token_source(mut self, tokens: Arc<dyn TokenSource>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Gets the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the user the requests are made for.
    #[must_use]
    pub fn session_owner(&self) -> Option<String> {
        self.tokens.as_ref().and_then(|t| t.session_owner())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.tokens.as_ref().and_then(|t| t.access_token()) {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Makes a GET request.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.get_with_query::<T, [(&str, &str); 0]>(path, None).await
    }

    /// Makes a GET request with query parameters.
    pub async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: Option<&Q>,
    ) -> ApiResult<T> {
        tracing::debug!(path, "GET");
        let mut request = self.http.get(self.url(path));
        if let Some(query) = query {
            request = request.query(query);
        }
        let response = self.authorize(request).send().await?;
        handle_response(path, response).await
    }

    /// Makes a POST request.
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        tracing::debug!(path, "POST");
        let request = self.http.post(self.url(path)).json(body);
        let response = self.authorize(request).send().await?;
        handle_response(path, response).await
    }

    /// Makes a PUT request.
    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        self.put_with_query::<B, T, [(&str, &str); 0]>(path, body, None)
            .await
    }

    /// Makes a PUT request with query parameters.
    pub async fn put_with_query<B: Serialize + ?Sized, T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        query: Option<&Q>,
    ) -> ApiResult<T> {
        tracing::debug!(path, "PUT");
        let mut request = self.http.put(self.url(path)).json(body);
        if let Some(query) = query {
            request = request.query(query);
        }
        let response = self.authorize(request).send().await?;
        handle_response(path, response).await
    }

    /// Makes a DELETE request.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        tracing::debug!(path, "DELETE");
        let request = self.http.delete(self.url(path));
        let response = self.authorize(request).send().await?;
        handle_response(path, response).await
    }
}

/// Percent-encodes one path segment.
///
/// # Errors
///
/// Returns `ApiError::InvalidRequest` for an empty segment.
pub fn segment(value: &str) -> ApiResult<String> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidRequest("empty path segment".to_string()));
    }
    Ok(urlencoding::encode(value).into_owned())
}

/// Handles a response with a body.
async fn handle_response<T: DeserializeOwned>(path: &str, response: Response) -> ApiResult<T> {
    let status = response.status();

    if status.is_success() {
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(serde_json::from_value(serde_json::Value::Null)?);
        }
        return Ok(serde_json::from_slice(&bytes)?);
    }

    let text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
    let message = error_message(&text);
    tracing::debug!(path, status = status.as_u16(), %message, "request failed");
    Err(match status {
        StatusCode::NOT_FOUND => ApiError::NotFound(if message.is_empty() { path.to_string() } else { message }),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(message),
        _ => ApiError::Api {
            status: status.as_u16(),
            message,
        },
    })
}

fn error_message(text: &str) -> String {
    match serde_json::from_str::<ErrorBody>(text) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => text.trim().to_string(),
    }
}
