use async_trait::async_trait;
use axum::http::StatusCode;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Credentials, Principal, SessionTokens};

/// AuthError
///
/// Failure reported by the auth provider. `Rejected` carries the provider's own
/// human-readable message (duplicate email, wrong password, ...) so it can be shown
/// to the user verbatim.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Authentication service is unavailable")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected response from authentication service: {0}")]
    Malformed(String),
}

impl AuthError {
    /// HTTP status this error maps to at the edge of our API.
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Rejected { status, .. } => match *status {
                401 | 403 => StatusCode::UNAUTHORIZED,
                409 => StatusCode::CONFLICT,
                429 => StatusCode::TOO_MANY_REQUESTS,
                400..=499 => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            },
            AuthError::Network(_) | AuthError::Malformed(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// AuthSession
///
/// Result of a successful auth call. `tokens` is `None` when the project requires email
/// confirmation and sign-up returned only the user.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub principal: Principal,
    pub tokens: Option<SessionTokens>,
}

/// AuthProvider
///
/// The auth collaborator as this service sees it. Implemented by `SupabaseAuthClient`
/// in production and by in-memory doubles in tests.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthSession, AuthError>;
    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthSession, AuthError>;
    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, AuthError>;
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
}

pub type AuthProviderState = Arc<dyn AuthProvider>;

// --- GoTrue wire types ---

#[derive(Deserialize)]
struct GoTrueUser {
    id: Uuid,
    email: Option<String>,
}

#[derive(Deserialize)]
struct GoTrueSession {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: GoTrueUser,
}

// Sign-up answers with a full session, or with the bare user when confirmation is pending.
#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpBody {
    Session(GoTrueSession),
    User(GoTrueUser),
}

#[derive(Deserialize, Default)]
struct GoTrueErrorBody {
    msg: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl From<GoTrueSession> for AuthSession {
    fn from(session: GoTrueSession) -> Self {
        AuthSession {
            principal: Principal {
                id: session.user.id,
                email: session.user.email,
            },
            tokens: Some(SessionTokens {
                access_token: session.access_token,
                refresh_token: session.refresh_token,
                expires_in: session.expires_in,
            }),
        }
    }
}

/// provider_message
///
/// GoTrue is inconsistent about where it puts the human-readable text; try each field in
/// turn and fall back to the raw body.
fn provider_message(body: &str) -> String {
    let parsed: GoTrueErrorBody = serde_json::from_str(body).unwrap_or_default();
    parsed
        .msg
        .or(parsed.error_description)
        .or(parsed.message)
        .or(parsed.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            let raw = body.trim();
            if raw.is_empty() {
                "An error occurred during authentication".to_string()
            } else {
                raw.to_string()
            }
        })
}

/// SupabaseAuthClient
///
/// Thin client for the Supabase GoTrue REST API. It is stateless: tokens are handed back
/// to the caller rather than cached, since one server instance serves many principals.
#[derive(Clone)]
pub struct SupabaseAuthClient {
    http: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseAuthClient {
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self::with_client(Client::new(), base_url, anon_key)
    }

    pub fn with_client(http: Client, base_url: &str, anon_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }

    async fn post_json(
        &self,
        path: &str,
        payload: serde_json::Value,
    ) -> Result<reqwest::Response, AuthError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;
        Self::check(response).await
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, AuthError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = provider_message(&body);
        tracing::warn!(status = status.as_u16(), %message, "auth provider rejected request");
        Err(AuthError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn read_session(response: reqwest::Response) -> Result<AuthSession, AuthError> {
        let body = response.text().await?;
        let session: GoTrueSession =
            serde_json::from_str(&body).map_err(|e| AuthError::Malformed(e.to_string()))?;
        Ok(session.into())
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuthClient {
    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthSession, AuthError> {
        let response = self
            .post_json(
                "/auth/v1/signup",
                serde_json::json!({ "email": credentials.email, "password": credentials.password }),
            )
            .await?;

        let body = response.text().await?;
        let parsed: SignUpBody =
            serde_json::from_str(&body).map_err(|e| AuthError::Malformed(e.to_string()))?;

        Ok(match parsed {
            SignUpBody::Session(session) => session.into(),
            SignUpBody::User(user) => AuthSession {
                principal: Principal {
                    id: user.id,
                    email: user.email,
                },
                tokens: None,
            },
        })
    }

    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthSession, AuthError> {
        let response = self
            .post_json(
                "/auth/v1/token?grant_type=password",
                serde_json::json!({ "email": credentials.email, "password": credentials.password }),
            )
            .await?;
        Self::read_session(response).await
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        let response = self
            .post_json(
                "/auth/v1/token?grant_type=refresh_token",
                serde_json::json!({ "refresh_token": refresh_token }),
            )
            .await?;
        Self::read_session(response).await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let url = format!("{}/auth/v1/logout", self.base_url);
        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
