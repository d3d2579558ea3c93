use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{repository::RepoError, supabase::AuthError};

/// ApiError
///
/// The error type returned by handlers. Every variant renders as `{ "error": "<message>" }`
/// so the SPA can show it as a dismissible notification without interpreting it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Payload rejected before any collaborator was called.
    #[error("{0}")]
    Validation(String),

    /// Auth provider refused or could not be reached.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Profile store failure on a write or aggregate path. Lookups used for role
    /// resolution never surface here.
    #[error(transparent)]
    Store(#[from] RepoError),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("missing bearer token")]
    MissingToken,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(e) => e.status(),
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Storage(_) => StatusCode::BAD_GATEWAY,
            ApiError::MissingToken => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Internals stay in the logs.
            ApiError::Store(e) => {
                tracing::error!(error = %e, "profile store failure");
                "Something went wrong with the profile store, please try again".to_string()
            }
            ApiError::Storage(e) => {
                tracing::error!(error = %e, "storage failure");
                "File storage is currently unavailable".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
