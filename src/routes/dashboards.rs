use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Dashboard Router Module
///
/// Data behind the role dashboards. Each handler takes a `Guarded<P>` for its page, so
/// a misrouted caller gets 403 with the page they belong on.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        // GET /dashboard/user (users)
        .route("/dashboard/user", get(handlers::get_user_dashboard))
        // GET /dashboard/trainer (approved trainers)
        .route("/dashboard/trainer", get(handlers::get_trainer_dashboard))
        // GET /dashboard/pending-trainer (trainers under review)
        .route(
            "/dashboard/pending-trainer",
            get(handlers::get_pending_trainer_dashboard),
        )
        // POST /trainer/documents/presigned (trainers, any review status)
        .route(
            "/trainer/documents/presigned",
            post(handlers::get_document_upload_url),
        )
}
