use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a session. Login, signup and refresh talk to the auth
/// provider; `/guard` treats a missing token as the signed-out state.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for the load balancer.
        .route("/health", get(|| async { "ok" }))
        // POST /auth/signup
        // Credentials plus the role-specific wizard data; creates auth user and profile.
        .route("/auth/signup", post(handlers::signup))
        // POST /auth/login
        .route("/auth/login", post(handlers::login))
        // POST /auth/refresh
        .route("/auth/refresh", post(handlers::refresh))
        // GET /guard?path=/trainer-dashboard
        // Lets the SPA router ask whether to render a page or where to redirect.
        .route("/guard", get(handlers::guard_check))
}
