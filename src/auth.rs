use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    models::{Principal, RoleRecord},
    repository::RepositoryState,
    resolver::RoleResolver,
};

/// Audience Supabase puts on access tokens of signed-in users.
pub const SUPABASE_AUDIENCE: &str = "authenticated";

/// Claims
///
/// The subset of a Supabase access token this service relies on.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// auth.users.id of the principal.
    pub sub: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    pub aud: String,
    pub exp: usize,
    pub iat: usize,
}

/// decode_principal
///
/// Verifies signature, expiry and audience of an access token and returns its principal.
pub fn decode_principal(token: &str, secret: &str) -> Result<Principal, jsonwebtoken::errors::Error> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.set_audience(&[SUPABASE_AUDIENCE]);

    let token_data = decode::<Claims>(token, &decoding_key, &validation)?;
    Ok(Principal {
        id: token_data.claims.sub,
        email: token_data.claims.email.filter(|e| !e.is_empty()),
    })
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// BearerToken
///
/// The raw access token, for calls that forward it to the auth provider (logout).
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        bearer_token(parts)
            .map(|token| BearerToken(token.to_string()))
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

/// Principal Extractor
///
/// Authenticates the request:
/// 1. In `Env::Local`, an `x-user-id` header (plus optional `x-user-email`) is accepted
///    as-is so the SPA can be developed without a live auth project.
/// 2. Otherwise a `Bearer` Supabase access token is required and verified.
///
/// Rejects with 401 on any failure. It does not touch the profile tables: an
/// authenticated principal without a profile is still a principal.
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        if config.env == Env::Local {
            let bypass_id = parts
                .headers
                .get("x-user-id")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| Uuid::parse_str(value).ok());
            if let Some(id) = bypass_id {
                let email = parts
                    .headers
                    .get("x-user-email")
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string);
                tracing::debug!(principal = %id, "local auth bypass");
                return Ok(Principal { id, email });
            }
        }

        let token = bearer_token(parts).ok_or(StatusCode::UNAUTHORIZED)?;

        decode_principal(token, &config.jwt_secret).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => tracing::debug!("expired access token"),
                _ => tracing::debug!(error = %e, "rejected access token"),
            }
            StatusCode::UNAUTHORIZED
        })
    }
}

/// ResolvedSession
///
/// An authenticated principal together with its resolved role (if any). Unlike
/// `Guarded`, it never redirects; callers decide what to do with an unresolved role.
#[derive(Debug, Clone)]
pub struct ResolvedSession {
    pub principal: Principal,
    pub record: Option<RoleRecord>,
}

impl<S> FromRequestParts<S> for ResolvedSession
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let principal = Principal::from_request_parts(parts, state).await?;
        let resolver = RoleResolver::new(RepositoryState::from_ref(state));
        let record = resolver.resolve(&principal).await;
        Ok(ResolvedSession { principal, record })
    }
}
