//! Cognito user-pool provider.
//!
//! Speaks the user-pool JSON protocol directly: every operation is a `POST`
//! to the regional endpoint with the operation named in `X-Amz-Target`.
//! Only public-client operations are used, so requests are not signed.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use merida_core::AuthConfig;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::attributes::{self, Attributes, CHALLENGE_ATTRIBUTE_PREFIX};
use crate::error::{AuthError, AuthResult};
use crate::provider::{
    ChallengeKind, IdentityProvider, ProviderChallenge, ProviderResponse, TokenSet, UserProfile,
};

const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService.";
const PASSWORD_FLOW: &str = "USER_PASSWORD_AUTH";

/// Cognito user-pool identity provider.
#[derive(Debug, Clone)]
pub struct CognitoProvider {
    http: reqwest::Client,
    endpoint: String,
    client_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthRequest<'a> {
    auth_flow: &'a str,
    client_id: &'a str,
    auth_parameters: BTreeMap<&'a str, &'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct RespondToAuthChallengeRequest<'a> {
    challenge_name: &'a str,
    client_id: &'a str,
    session: &'a str,
    challenge_responses: BTreeMap<String, String>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AccessTokenRequest<'a> {
    access_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthResponse {
    challenge_name: Option<String>,
    session: Option<String>,
    #[serde(default)]
    challenge_parameters: BTreeMap<String, String>,
    authentication_result: Option<AuthenticationResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    access_token: String,
    id_token: Option<String>,
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: i64,
    #[serde(default = "default_token_type")]
    token_type: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetUserResponse {
    username: String,
    #[serde(default)]
    user_attributes: Vec<AttributeType>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AttributeType {
    name: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(rename = "__type", default)]
    kind: String,
    #[serde(alias = "Message", default)]
    message: String,
}

impl CognitoProvider {
    /// Creates a provider from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &AuthConfig) -> AuthResult<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(http, config.endpoint_url(), &config.client_id))
    }

    /// Creates a provider with an existing HTTP client.
    #[must_use]
    pub fn with_client(http: reqwest::Client, endpoint: impl Into<String>, client_id: &str) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            client_id: client_id.to_string(),
        }
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call<B, T>(&self, operation: &str, body: &B) -> AuthResult<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .header("X-Amz-Target", format!("{TARGET_PREFIX}{operation}"))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if status.is_success() {
            let body = if text.trim().is_empty() { "{}" } else { text.as_str() };
            Ok(serde_json::from_str(body)?)
        } else {
            let error: ErrorResponse =
                serde_json::from_str(&text).unwrap_or_else(|_| ErrorResponse {
                    kind: format!("HTTP{}", status.as_u16()),
                    message: text,
                });
            tracing::debug!(operation, code = %error.kind, "identity provider rejected request");
            Err(map_error(&error.kind, error.message))
        }
    }
}

/// Maps a provider error code to an [`AuthError`].
fn map_error(kind: &str, message: String) -> AuthError {
    // Codes may arrive namespaced, e.g. "com.amazonaws...#NotAuthorizedException".
    let code = kind.rsplit('#').next().unwrap_or(kind);
    match code {
        "NotAuthorizedException" | "UserNotFoundException" => AuthError::InvalidCredentials,
        "PasswordResetRequiredException" => AuthError::PasswordResetRequired,
        "UserNotConfirmedException" => AuthError::UserNotConfirmed,
        "InvalidPasswordException" => AuthError::InvalidPassword(message),
        "ExpiredCodeException" | "CodeMismatchException" => AuthError::ChallengeExpired,
        _ => AuthError::Provider {
            code: code.to_string(),
            message,
        },
    }
}

fn parse_challenge(
    name: &str,
    session: Option<String>,
    parameters: &BTreeMap<String, String>,
) -> AuthResult<ProviderChallenge> {
    let session = session.ok_or_else(|| AuthError::Provider {
        code: "InvalidResponse".to_string(),
        message: format!("challenge {name} without session"),
    })?;

    let required_attributes: BTreeSet<String> = match parameters.get("requiredAttributes") {
        Some(raw) if !raw.trim().is_empty() => serde_json::from_str::<Vec<String>>(raw)?
            .iter()
            .map(|a| attributes::normalize(a).to_string())
            .collect(),
        _ => BTreeSet::new(),
    };

    let existing_attributes: Attributes = match parameters.get("userAttributes") {
        Some(raw) if !raw.trim().is_empty() => {
            serde_json::from_str::<BTreeMap<String, serde_json::Value>>(raw)?
                .into_iter()
                .filter_map(|(k, v)| match v {
                    serde_json::Value::String(s) => Some((k, s)),
                    serde_json::Value::Null => None,
                    other => Some((k, other.to_string())),
                })
                .collect()
        }
        _ => Attributes::new(),
    };

    Ok(ProviderChallenge {
        kind: ChallengeKind::from_name(name),
        session,
        required_attributes,
        existing_attributes,
    })
}

fn into_provider_response(response: AuthResponse) -> AuthResult<ProviderResponse> {
    if let Some(result) = response.authentication_result {
        return Ok(ProviderResponse::Authenticated(TokenSet {
            access_token: result.access_token,
            id_token: result.id_token,
            refresh_token: result.refresh_token,
            expires_in: result.expires_in,
            token_type: result.token_type,
        }));
    }
    match response.challenge_name {
        Some(name) => Ok(ProviderResponse::Challenge(parse_challenge(
            &name,
            response.session,
            &response.challenge_parameters,
        )?)),
        None => Err(AuthError::Provider {
            code: "InvalidResponse".to_string(),
            message: "neither tokens nor challenge in response".to_string(),
        }),
    }
}

#[async_trait]
impl IdentityProvider for CognitoProvider {
    fn id(&self) -> &'static str {
        "cognito"
    }

    async fn initiate_auth(&self, username: &str, password: &str) -> AuthResult<ProviderResponse> {
        let mut auth_parameters = BTreeMap::new();
        auth_parameters.insert("USERNAME", username);
        auth_parameters.insert("PASSWORD", password);

        let request = InitiateAuthRequest {
            auth_flow: PASSWORD_FLOW,
            client_id: &self.client_id,
            auth_parameters,
        };
        let response: AuthResponse = self.call("InitiateAuth", &request).await?;
        into_provider_response(response)
    }

    async fn respond_to_new_password_challenge(
        &self,
        username: &str,
        challenge_session: &str,
        new_password: &str,
        attributes: &Attributes,
    ) -> AuthResult<ProviderResponse> {
        let mut challenge_responses = BTreeMap::new();
        challenge_responses.insert("USERNAME".to_string(), username.to_string());
        challenge_responses.insert("NEW_PASSWORD".to_string(), new_password.to_string());
        for (name, value) in attributes {
            challenge_responses.insert(format!("{CHALLENGE_ATTRIBUTE_PREFIX}{name}"), value.clone());
        }

        let request = RespondToAuthChallengeRequest {
            challenge_name: ChallengeKind::NEW_PASSWORD_REQUIRED,
            client_id: &self.client_id,
            session: challenge_session,
            challenge_responses,
        };
        let response: AuthResponse = self.call("RespondToAuthChallenge", &request).await?;
        into_provider_response(response)
    }

    async fn get_user(&self, access_token: &str) -> AuthResult<UserProfile> {
        let response: GetUserResponse = self
            .call("GetUser", &AccessTokenRequest { access_token })
            .await?;
        Ok(UserProfile {
            username: response.username,
            attributes: response
                .user_attributes
                .into_iter()
                .map(|a| (a.name, a.value))
                .collect(),
        })
    }

    async fn global_sign_out(&self, access_token: &str) -> AuthResult<()> {
        let _: serde_json::Value = self
            .call("GlobalSignOut", &AccessTokenRequest { access_token })
            .await?;
        Ok(())
    }
}
