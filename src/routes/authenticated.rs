use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Wrapped by the authentication layer in `create_router`: every request here carries
/// a verified principal. No role is required.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // Principal, resolved role, profile and landing page.
        .route("/me", get(handlers::get_me))
        // POST /auth/logout
        // Revokes the bearer token's session at the auth provider.
        .route("/auth/logout", post(handlers::logout))
}
