use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod resolver;
pub mod session;
pub mod storage;
pub mod supabase;

pub mod routes;
use models::Principal;
use routes::{admin, authenticated, dashboards, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};
pub use supabase::{AuthProviderState, SupabaseAuthClient};

/// ApiDoc
///
/// OpenAPI document for every handler and schema, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::signup, handlers::login, handlers::refresh, handlers::logout,
        handlers::get_me, handlers::guard_check, handlers::get_user_dashboard,
        handlers::get_trainer_dashboard, handlers::get_pending_trainer_dashboard,
        handlers::get_admin_stats, handlers::list_trainers, handlers::get_document_upload_url,
    ),
    components(
        schemas(
            models::Principal, models::Role, models::TrainerStatus, models::Gender,
            models::ExperienceLevel, models::TimePreference, models::UserProfile,
            models::TrainerProfile, models::AdminRecord, models::RoleRecord,
            models::Credentials, models::UserSignupData, models::TrainerSignupData,
            models::SignupProfile, models::SignupRequest, models::RefreshRequest,
            models::SessionTokens, models::SessionSummary, models::GuardResponse,
            models::AdminDashboardStats, models::DocumentUploadRequest,
            models::DocumentUploadResponse,
        )
    ),
    tags(
        (name = "vyayam-portal", description = "Fitness marketplace portal API")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// Shared, immutable container of every collaborator a request may need.
#[derive(Clone)]
pub struct AppState {
    /// Profile store (Supabase Postgres).
    pub repo: RepositoryState,
    /// Auth collaborator (Supabase GoTrue).
    pub auth: AuthProviderState,
    /// Trainer document storage.
    pub storage: StorageState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AuthProviderState {
    fn from_ref(app_state: &AppState) -> AuthProviderState {
        app_state.auth.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Rejects the request with 401 unless a `Principal` can be extracted.
async fn auth_middleware(_principal: Principal, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing groups, the request-id and tracing layers, and CORS.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        // Guarded per handler; a 401/403 body tells the SPA where to go.
        .merge(dashboards::dashboard_routes())
        .nest("/admin", admin::admin_routes())
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// One span per request, tagged with its `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
