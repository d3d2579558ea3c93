use crate::{
    AppState,
    auth::{BearerToken, ResolvedSession},
    error::ApiError,
    guard::{
        AdminDashboardPage, GuardDecision, GuardRejection, Guarded, PendingTrainerDashboardPage,
        TrainerArea, TrainerDashboardPage, UserDashboardPage, decide_for_page,
    },
    models::{
        AdminDashboardStats, Credentials, DocumentUploadRequest, DocumentUploadResponse,
        GuardQuery, GuardResponse, Principal, RefreshRequest, RoleRecord, SessionSummary,
        SessionTokens, SignupProfile, SignupRequest, TrainerListFilter, TrainerProfile,
        UserProfile,
    },
    resolver::{RoleResolver, paths, redirect_path},
    session::SessionState,
    storage::{ALLOWED_DOCUMENT_TYPES, MAX_DOCUMENT_BYTES, document_key},
};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};

/// summarize
///
/// Builds the session summary the SPA navigates with.
fn summarize(
    principal: Principal,
    record: Option<RoleRecord>,
    tokens: Option<SessionTokens>,
) -> SessionSummary {
    SessionSummary {
        redirect_to: redirect_path(record.as_ref()).to_string(),
        role: record.as_ref().map(RoleRecord::role),
        trainer_status: record.as_ref().and_then(RoleRecord::trainer_status),
        principal,
        record,
        tokens,
    }
}

// --- Auth ---

/// signup
///
/// [Public Route] Creates the auth principal, then the matching profile row. Trainers
/// start as `pending` and are sent to the pending dashboard.
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = SessionSummary),
        (status = 400, description = "Invalid signup data"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SessionSummary>), ApiError> {
    payload.validate().map_err(ApiError::Validation)?;

    let session = state.auth.sign_up(&payload.credentials).await?;
    let mut principal = session.principal;
    if principal.email.is_none() {
        principal.email = Some(payload.credentials.email.trim().to_string());
    }

    // TODO: delete the orphaned auth user through the GoTrue admin API when the profile insert fails.
    let record = match &payload.profile {
        SignupProfile::User(data) => state
            .repo
            .create_user_profile(principal.id, data)
            .await
            .map(RoleRecord::User),
        SignupProfile::Trainer(data) => state
            .repo
            .create_trainer_profile(principal.id, data)
            .await
            .map(RoleRecord::Trainer),
    }
    .inspect_err(|e| {
        tracing::error!(
            principal = %principal.id,
            role = %payload.profile.role(),
            error = %e,
            "auth user created but profile insert failed"
        );
    })?;

    tracing::info!(principal = %principal.id, role = %record.role(), "signup completed");
    Ok((
        StatusCode::CREATED,
        Json(summarize(principal, Some(record), session.tokens)),
    ))
}

/// login
///
/// [Public Route] Password sign-in followed by role resolution. The response carries
/// the landing page for the resolved role.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = Credentials,
    responses(
        (status = 200, description = "Signed in", body = SessionSummary),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<SessionSummary>, ApiError> {
    let session = state.auth.sign_in_with_password(&credentials).await?;
    let record = RoleResolver::new(state.repo.clone())
        .resolve(&session.principal)
        .await;

    tracing::info!(
        principal = %session.principal.id,
        role = ?record.as_ref().map(RoleRecord::role),
        "login"
    );
    Ok(Json(summarize(session.principal, record, session.tokens)))
}

/// refresh
///
/// [Public Route] Exchanges a refresh token and re-resolves the role, so a trainer
/// approved in the meantime is routed to the approved dashboard.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Session refreshed", body = SessionSummary),
        (status = 401, description = "Refresh token rejected")
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<SessionSummary>, ApiError> {
    if payload.refresh_token.trim().is_empty() {
        return Err(ApiError::MissingToken);
    }
    let session = state.auth.refresh_session(&payload.refresh_token).await?;
    let record = RoleResolver::new(state.repo.clone())
        .resolve(&session.principal)
        .await;
    Ok(Json(summarize(session.principal, record, session.tokens)))
}

/// logout
///
/// [Authenticated Route] Revokes the caller's session at the auth provider.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Signed out"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<StatusCode, ApiError> {
    state.auth.sign_out(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Session ---

/// get_me
///
/// [Authenticated Route] The caller's principal, resolved role and landing page.
/// An authenticated principal without any profile is not an error: it answers with
/// no role and `redirect_to = /unauthorized`.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Current session", body = SessionSummary),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_me(session: ResolvedSession) -> Json<SessionSummary> {
    Json(summarize(session.principal, session.record, None))
}

/// guard_check
///
/// [Public Route] Runs the route guard for an SPA path. A missing or invalid token is
/// the signed-out state, not an error.
#[utoipa::path(
    get,
    path = "/guard",
    params(GuardQuery),
    responses((status = 200, description = "Guard decision", body = GuardResponse))
)]
pub async fn guard_check(
    State(state): State<AppState>,
    principal: Result<Principal, StatusCode>,
    Query(query): Query<GuardQuery>,
) -> Json<GuardResponse> {
    let session = match principal {
        Ok(principal) => {
            let record = RoleResolver::new(state.repo.clone())
                .resolve(&principal)
                .await;
            SessionState::Ready { principal, record }
        }
        Err(_) => SessionState::SignedOut,
    };

    let (decision, redirect_to) = match decide_for_page(&session, &query.path) {
        GuardDecision::Loading => ("loading", None),
        GuardDecision::Render => ("render", None),
        GuardDecision::Redirect(target) => ("redirect", Some(target.to_string())),
    };

    Json(GuardResponse {
        role: session.record().map(RoleRecord::role),
        path: query.path,
        decision: decision.to_string(),
        redirect_to,
    })
}

// --- Dashboards ---

/// get_user_dashboard
///
/// [User Route] The client's own profile.
#[utoipa::path(
    get,
    path = "/dashboard/user",
    responses(
        (status = 200, description = "User profile", body = UserProfile),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Wrong role; body names the page to go to")
    )
)]
pub async fn get_user_dashboard(
    page: Guarded<UserDashboardPage>,
) -> Result<Json<UserProfile>, GuardRejection> {
    match page.record {
        Some(RoleRecord::User(profile)) => Ok(Json(profile)),
        _ => Err(GuardRejection::Redirect(paths::UNAUTHORIZED)),
    }
}

/// get_trainer_dashboard
///
/// [Approved Trainer Route] The trainer's own profile.
#[utoipa::path(
    get,
    path = "/dashboard/trainer",
    responses(
        (status = 200, description = "Trainer profile", body = TrainerProfile),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Wrong role or status")
    )
)]
pub async fn get_trainer_dashboard(
    page: Guarded<TrainerDashboardPage>,
) -> Result<Json<TrainerProfile>, GuardRejection> {
    trainer_profile(page.record)
}

/// get_pending_trainer_dashboard
///
/// [Pending Trainer Route] The submitted application while it is under review.
#[utoipa::path(
    get,
    path = "/dashboard/pending-trainer",
    responses(
        (status = 200, description = "Trainer application", body = TrainerProfile),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Wrong role or status")
    )
)]
pub async fn get_pending_trainer_dashboard(
    page: Guarded<PendingTrainerDashboardPage>,
) -> Result<Json<TrainerProfile>, GuardRejection> {
    trainer_profile(page.record)
}

fn trainer_profile(record: Option<RoleRecord>) -> Result<Json<TrainerProfile>, GuardRejection> {
    match record {
        Some(RoleRecord::Trainer(profile)) => Ok(Json(profile)),
        _ => Err(GuardRejection::Redirect(paths::UNAUTHORIZED)),
    }
}

// --- Admin ---

/// get_admin_stats
///
/// [Admin Route] Dashboard counters. Trainer counts are read from the status column.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses(
        (status = 200, description = "Admin stats", body = AdminDashboardStats),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn get_admin_stats(
    _admin: Guarded<AdminDashboardPage>,
    State(state): State<AppState>,
) -> Result<Json<AdminDashboardStats>, ApiError> {
    let stats = state.repo.get_stats().await?;
    Ok(Json(stats))
}

/// list_trainers
///
/// [Admin Route] Read-only listing of trainer applications, newest first.
#[utoipa::path(
    get,
    path = "/admin/trainers",
    params(TrainerListFilter),
    responses(
        (status = 200, description = "Trainers", body = [TrainerProfile]),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn list_trainers(
    _admin: Guarded<AdminDashboardPage>,
    State(state): State<AppState>,
    Query(filter): Query<TrainerListFilter>,
) -> Result<Json<Vec<TrainerProfile>>, ApiError> {
    let trainers = state.repo.list_trainers(filter.status).await?;
    Ok(Json(trainers))
}

// --- Trainer Documents ---

/// get_document_upload_url
///
/// [Trainer Route] Presigned PUT URL for a certification or government-id document.
/// Available in every review state so a pending applicant can complete their file.
#[utoipa::path(
    post,
    path = "/trainer/documents/presigned",
    request_body = DocumentUploadRequest,
    responses(
        (status = 200, description = "Upload URL", body = DocumentUploadResponse),
        (status = 400, description = "Unsupported file type, empty file or file over 5MB"),
        (status = 403, description = "Not a trainer")
    )
)]
pub async fn get_document_upload_url(
    trainer: Guarded<TrainerArea>,
    State(state): State<AppState>,
    Json(payload): Json<DocumentUploadRequest>,
) -> Result<Json<DocumentUploadResponse>, ApiError> {
    let file_type = payload.file_type.trim().to_ascii_lowercase();
    if !ALLOWED_DOCUMENT_TYPES.contains(&file_type.as_str()) {
        return Err(ApiError::Validation(
            "Only PDF, JPEG and PNG documents are accepted".to_string(),
        ));
    }
    if payload.size_bytes == 0 {
        return Err(ApiError::Validation("The selected file is empty".to_string()));
    }
    if payload.size_bytes > MAX_DOCUMENT_BYTES {
        return Err(ApiError::Validation(
            "File exceeds the maximum size limit of 5MB".to_string(),
        ));
    }

    let key = document_key(trainer.principal.id, &payload.filename);
    let upload_url = state
        .storage
        .get_presigned_upload_url(&key, &file_type, payload.size_bytes)
        .await
        .map_err(ApiError::Storage)?;

    tracing::debug!(trainer = %trainer.principal.id, %key, "presigned document upload");
    Ok(Json(DocumentUploadResponse {
        upload_url,
        resource_key: key,
    }))
}
