use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Nested under `/admin`. Every handler takes `Guarded<AdminDashboardPage>`, so only a
/// principal whose email is in `admins` gets through. Approval of trainer applications
/// is handled outside this service; these routes only read.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/stats
        // User and trainer counts, trainers broken down by review status.
        .route("/stats", get(handlers::get_admin_stats))
        // GET /admin/trainers?status=pending
        .route("/trainers", get(handlers::list_trainers))
}
