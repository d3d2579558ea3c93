use std::marker::PhantomData;

use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};

use crate::{
    config::AppConfig,
    models::{Principal, Role, RoleRecord, TrainerStatus},
    repository::RepositoryState,
    resolver::{RoleResolver, paths, redirect_path},
    session::SessionState,
};

/// PageRequirements
///
/// Who may see a page. Empty `roles` means any signed-in principal. `trainer_statuses`
/// only narrows access for trainers and is ignored for other roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequirements {
    pub roles: &'static [Role],
    pub trainer_statuses: &'static [TrainerStatus],
}

impl PageRequirements {
    pub const ANY: PageRequirements = PageRequirements {
        roles: &[],
        trainer_statuses: &[],
    };
}

/// GuardDecision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session not settled yet: show a neutral placeholder, never redirect.
    Loading,
    Render,
    Redirect(&'static str),
}

/// decide
///
/// The access policy for one page:
/// - loading or still resolving: wait;
/// - no principal: go to login;
/// - no role requirements: render for anyone signed in;
/// - no role at all: unauthorized;
/// - wrong role: that role's own dashboard;
/// - trainer with a status outside the page's set: pending dashboard when pending,
///   otherwise the approved-trainer dashboard.
pub fn decide(session: &SessionState, requirements: &PageRequirements) -> GuardDecision {
    let record = match session {
        SessionState::Loading | SessionState::Resolving(_) => return GuardDecision::Loading,
        SessionState::SignedOut => return GuardDecision::Redirect(paths::LOGIN),
        SessionState::Ready { record, .. } => record.as_ref(),
    };

    if requirements.roles.is_empty() {
        return GuardDecision::Render;
    }

    let Some(record) = record else {
        return GuardDecision::Redirect(paths::UNAUTHORIZED);
    };

    let role = record.role();
    if !requirements.roles.contains(&role) {
        return GuardDecision::Redirect(redirect_path(Some(record)));
    }

    if role == Role::Trainer && !requirements.trainer_statuses.is_empty() {
        match record.trainer_status() {
            Some(status) if requirements.trainer_statuses.contains(&status) => {}
            Some(TrainerStatus::Pending) => {
                return GuardDecision::Redirect(paths::PENDING_TRAINER_DASHBOARD);
            }
            _ => return GuardDecision::Redirect(paths::TRAINER_DASHBOARD),
        }
    }

    GuardDecision::Render
}

// --- Page Table ---

/// PagePolicy
///
/// Binds an SPA path to its requirements at the type level so guarded handlers can
/// name the page they serve.
pub trait PagePolicy: Send + Sync + 'static {
    const PATH: &'static str;
    const REQUIREMENTS: PageRequirements;
}

pub struct UserDashboardPage;
pub struct PendingTrainerDashboardPage;
pub struct TrainerDashboardPage;
pub struct AdminDashboardPage;
/// Not an SPA page: backs trainer-only API calls regardless of review status.
pub struct TrainerArea;

impl PagePolicy for UserDashboardPage {
    const PATH: &'static str = paths::USER_DASHBOARD;
    const REQUIREMENTS: PageRequirements = PageRequirements {
        roles: &[Role::User],
        trainer_statuses: &[],
    };
}

impl PagePolicy for PendingTrainerDashboardPage {
    const PATH: &'static str = paths::PENDING_TRAINER_DASHBOARD;
    const REQUIREMENTS: PageRequirements = PageRequirements {
        roles: &[Role::Trainer],
        trainer_statuses: &[TrainerStatus::Pending],
    };
}

impl PagePolicy for TrainerDashboardPage {
    const PATH: &'static str = paths::TRAINER_DASHBOARD;
    const REQUIREMENTS: PageRequirements = PageRequirements {
        roles: &[Role::Trainer],
        trainer_statuses: &[TrainerStatus::Approved],
    };
}

impl PagePolicy for AdminDashboardPage {
    const PATH: &'static str = paths::ADMIN_DASHBOARD;
    const REQUIREMENTS: PageRequirements = PageRequirements {
        roles: &[Role::Admin],
        trainer_statuses: &[],
    };
}

impl PagePolicy for TrainerArea {
    const PATH: &'static str = "/trainer";
    const REQUIREMENTS: PageRequirements = PageRequirements {
        roles: &[Role::Trainer],
        trainer_statuses: &[],
    };
}

/// Protected SPA pages. Anything not listed is public.
pub const PAGES: &[(&str, PageRequirements)] = &[
    (UserDashboardPage::PATH, UserDashboardPage::REQUIREMENTS),
    (
        PendingTrainerDashboardPage::PATH,
        PendingTrainerDashboardPage::REQUIREMENTS,
    ),
    (TrainerDashboardPage::PATH, TrainerDashboardPage::REQUIREMENTS),
    (AdminDashboardPage::PATH, AdminDashboardPage::REQUIREMENTS),
];

/// Requirements of an SPA path; trailing slashes are ignored.
pub fn requirements_for(path: &str) -> Option<PageRequirements> {
    let trimmed = path.trim_end_matches('/');
    let normalized = if trimmed.is_empty() { "/" } else { trimmed };
    PAGES
        .iter()
        .find(|(page, _)| *page == normalized)
        .map(|(_, requirements)| *requirements)
}

/// decide_for_page
///
/// `decide` against the page table. Paths outside the table render for everyone,
/// signed out or not. A redirect back to the page being guarded (a rejected trainer or
/// one without status hitting the approved dashboard) would loop, so it becomes a
/// redirect to the unauthorized page instead.
pub fn decide_for_page(session: &SessionState, path: &str) -> GuardDecision {
    match requirements_for(path) {
        Some(requirements) => decide_without_loop(session, path, &requirements),
        None => GuardDecision::Render,
    }
}

fn decide_without_loop(
    session: &SessionState,
    path: &str,
    requirements: &PageRequirements,
) -> GuardDecision {
    match decide(session, requirements) {
        GuardDecision::Redirect(target)
            if target.trim_end_matches('/') == path.trim_end_matches('/') =>
        {
            GuardDecision::Redirect(paths::UNAUTHORIZED)
        }
        decision => decision,
    }
}

// --- Axum Integration ---

/// GuardRejection
///
/// How a guard redirect travels over the JSON API: 401 when the caller must log in,
/// 403 otherwise, with the SPA path to navigate to.
#[derive(Debug, PartialEq, Eq)]
pub enum GuardRejection {
    Redirect(&'static str),
    NotReady,
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        match self {
            GuardRejection::Redirect(path) => {
                let status = if path == paths::LOGIN {
                    StatusCode::UNAUTHORIZED
                } else {
                    StatusCode::FORBIDDEN
                };
                (status, Json(serde_json::json!({ "redirect_to": path }))).into_response()
            }
            GuardRejection::NotReady => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        }
    }
}

/// Guarded
///
/// Extractor that authenticates the caller, resolves their role and applies the
/// policy of page `P`. Handlers taking a `Guarded<P>` only run when the guard says
/// `Render`.
pub struct Guarded<P: PagePolicy> {
    pub principal: Principal,
    pub record: Option<RoleRecord>,
    _page: PhantomData<P>,
}

impl<S, P> FromRequestParts<S> for Guarded<P>
where
    S: Send + Sync,
    P: PagePolicy,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = GuardRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = match Principal::from_request_parts(parts, state).await {
            Ok(principal) => {
                let resolver = RoleResolver::new(RepositoryState::from_ref(state));
                let record = resolver.resolve(&principal).await;
                SessionState::Ready { principal, record }
            }
            Err(_) => SessionState::SignedOut,
        };

        match decide_without_loop(&session, P::PATH, &P::REQUIREMENTS) {
            GuardDecision::Render => match session {
                SessionState::Ready { principal, record } => Ok(Guarded {
                    principal,
                    record,
                    _page: PhantomData,
                }),
                _ => Err(GuardRejection::Redirect(paths::LOGIN)),
            },
            GuardDecision::Redirect(path) => {
                tracing::debug!(page = P::PATH, redirect_to = path, "guard redirect");
                Err(GuardRejection::Redirect(path))
            }
            GuardDecision::Loading => Err(GuardRejection::NotReady),
        }
    }
}
