mod common;

use axum::{
    extract::FromRequestParts,
    http::{Request, StatusCode, header, request::Parts},
    response::IntoResponse,
};
use common::{
    MockAuth, MockRepo, admin_record, app_state, create_token, principal, trainer_profile,
    user_profile,
};
use std::sync::Arc;
use vyayam_portal::{
    AppState,
    auth::{BearerToken, ResolvedSession, SUPABASE_AUDIENCE, decode_principal},
    config::Env,
    guard::{AdminDashboardPage, GuardRejection, Guarded, TrainerArea, TrainerDashboardPage},
    models::{Principal, Role, TrainerStatus},
};

// --- Helpers ---

fn state_with(repo: MockRepo) -> AppState {
    app_state(Arc::new(repo), Arc::new(MockAuth::new(principal(None))))
}

fn production(mut state: AppState) -> AppState {
    state.config.env = Env::Production;
    state
}

fn parts_with(headers: &[(&str, &str)]) -> Parts {
    let mut builder = Request::builder().uri("/me");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(()).unwrap().into_parts().0
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

// --- Token Verification ---

#[test]
fn test_decode_principal_valid_token() {
    let p = principal(Some("client@example.com"));
    let secret = "unit-test-secret";
    let token = create_token(&p, SUPABASE_AUDIENCE, secret, 3600);

    assert_eq!(decode_principal(&token, secret).unwrap(), p);
}

#[test]
fn test_decode_principal_rejects_wrong_audience() {
    let p = principal(None);
    let token = create_token(&p, "anon", "unit-test-secret", 3600);

    assert!(decode_principal(&token, "unit-test-secret").is_err());
}

#[test]
fn test_decode_principal_rejects_wrong_secret() {
    let p = principal(None);
    let token = create_token(&p, SUPABASE_AUDIENCE, "other-secret", 3600);

    assert!(decode_principal(&token, "unit-test-secret").is_err());
}

// --- Principal Extractor ---

#[tokio::test]
async fn test_principal_from_valid_bearer() {
    let state = production(state_with(MockRepo::default()));
    let p = principal(Some("coach@example.com"));
    let token = create_token(&p, SUPABASE_AUDIENCE, &state.config.jwt_secret, 3600);
    let mut parts = parts_with(&[(header::AUTHORIZATION.as_str(), bearer(&token).as_str())]);

    let extracted = Principal::from_request_parts(&mut parts, &state).await.unwrap();
    assert_eq!(extracted, p);
}

#[tokio::test]
async fn test_principal_rejects_expired_token() {
    let state = state_with(MockRepo::default());
    let p = principal(None);
    // Beyond the default 60s leeway.
    let token = create_token(&p, SUPABASE_AUDIENCE, &state.config.jwt_secret, -3600);
    let mut parts = parts_with(&[("authorization", bearer(&token).as_str())]);

    let result = Principal::from_request_parts(&mut parts, &state).await;
    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_principal_rejects_missing_and_malformed_headers() {
    let state = state_with(MockRepo::default());

    let mut none = parts_with(&[]);
    assert_eq!(
        Principal::from_request_parts(&mut none, &state).await.unwrap_err(),
        StatusCode::UNAUTHORIZED
    );

    let mut basic = parts_with(&[("authorization", "Basic dXNlcjpwYXNz")]);
    assert_eq!(
        Principal::from_request_parts(&mut basic, &state).await.unwrap_err(),
        StatusCode::UNAUTHORIZED
    );

    let mut garbage = parts_with(&[("authorization", "Bearer not-a-jwt")]);
    assert_eq!(
        Principal::from_request_parts(&mut garbage, &state).await.unwrap_err(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_local_bypass_headers() {
    let state = state_with(MockRepo::default());
    let p = principal(Some("dev@example.com"));
    let id = p.id.to_string();
    let mut parts = parts_with(&[("x-user-id", id.as_str()), ("x-user-email", "dev@example.com")]);

    let extracted = Principal::from_request_parts(&mut parts, &state).await.unwrap();
    assert_eq!(extracted, p);
}

#[tokio::test]
async fn test_bypass_ignored_in_production() {
    let state = production(state_with(MockRepo::default()));
    let id = principal(None).id.to_string();
    let mut parts = parts_with(&[("x-user-id", id.as_str())]);

    let result = Principal::from_request_parts(&mut parts, &state).await;
    assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bearer_token_extractor() {
    let mut parts = parts_with(&[("authorization", "Bearer abc.def.ghi")]);
    let BearerToken(token) = BearerToken::from_request_parts(&mut parts, &()).await.unwrap();
    assert_eq!(token, "abc.def.ghi");

    let mut empty = parts_with(&[("authorization", "Bearer   ")]);
    assert!(BearerToken::from_request_parts(&mut empty, &()).await.is_err());
}

// --- Resolved Session & Guarded ---

#[tokio::test]
async fn test_resolved_session_without_profile() {
    let state = state_with(MockRepo::default());
    let id = principal(None).id.to_string();
    let mut parts = parts_with(&[("x-user-id", id.as_str())]);

    let session = ResolvedSession::from_request_parts(&mut parts, &state)
        .await
        .unwrap();
    assert_eq!(session.principal.id.to_string(), id);
    assert!(session.record.is_none());
}

#[tokio::test]
async fn test_resolved_session_with_profile() {
    let p = principal(Some("client@example.com"));
    let state = state_with(MockRepo::default().with_user(user_profile(p.id)));
    let id = p.id.to_string();
    let mut parts = parts_with(&[("x-user-id", id.as_str())]);

    let session = ResolvedSession::from_request_parts(&mut parts, &state)
        .await
        .unwrap();
    assert_eq!(session.record.map(|r| r.role()), Some(Role::User));
}

#[tokio::test]
async fn test_guarded_admin_page_accepts_admin() {
    let state = state_with(MockRepo::default().with_admin(admin_record("admin@x.com")));
    let id = principal(None).id.to_string();
    let mut parts = parts_with(&[("x-user-id", id.as_str()), ("x-user-email", "admin@x.com")]);

    let page = Guarded::<AdminDashboardPage>::from_request_parts(&mut parts, &state).await;
    let page = page.unwrap_or_else(|_| panic!("admin should pass the admin guard"));
    assert_eq!(page.record.map(|r| r.role()), Some(Role::Admin));
}

#[tokio::test]
async fn test_guarded_rejects_signed_out_with_login_redirect() {
    let state = state_with(MockRepo::default());
    let mut parts = parts_with(&[]);

    let result = Guarded::<AdminDashboardPage>::from_request_parts(&mut parts, &state).await;
    match result {
        Err(rejection) => {
            assert_eq!(rejection, GuardRejection::Redirect("/auth"));
            assert_eq!(rejection.into_response().status(), StatusCode::UNAUTHORIZED);
        }
        Ok(_) => panic!("signed-out caller must not pass"),
    }
}

#[tokio::test]
async fn test_guarded_redirects_pending_trainer() {
    let p = principal(Some("coach@example.com"));
    let state = state_with(
        MockRepo::default().with_trainer(trainer_profile(p.id, Some(TrainerStatus::Pending))),
    );
    let id = p.id.to_string();
    let mut parts = parts_with(&[("x-user-id", id.as_str())]);

    let result = Guarded::<TrainerDashboardPage>::from_request_parts(&mut parts, &state).await;
    match result {
        Err(rejection) => {
            assert_eq!(rejection, GuardRejection::Redirect("/pending-trainer-dashboard"));
            assert_eq!(rejection.into_response().status(), StatusCode::FORBIDDEN);
        }
        Ok(_) => panic!("pending trainer must not reach the approved dashboard"),
    }
}

#[tokio::test]
async fn test_trainer_area_accepts_every_status() {
    for status in [
        Some(TrainerStatus::Pending),
        Some(TrainerStatus::Approved),
        Some(TrainerStatus::Rejected),
        None,
    ] {
        let p = principal(None);
        let state = state_with(MockRepo::default().with_trainer(trainer_profile(p.id, status)));
        let id = p.id.to_string();
        let mut parts = parts_with(&[("x-user-id", id.as_str())]);

        let result = Guarded::<TrainerArea>::from_request_parts(&mut parts, &state).await;
        assert!(result.is_ok(), "status {:?} should pass", status);
    }
}
