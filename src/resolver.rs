use crate::{
    models::{Principal, RoleRecord, TrainerStatus},
    repository::RepositoryState,
};

/// Paths of the SPA that the access-control policy redirects to.
pub mod paths {
    pub const LOGIN: &str = "/auth";
    pub const UNAUTHORIZED: &str = "/unauthorized";
    pub const USER_DASHBOARD: &str = "/user-dashboard";
    pub const TRAINER_DASHBOARD: &str = "/trainer-dashboard";
    pub const PENDING_TRAINER_DASHBOARD: &str = "/pending-trainer-dashboard";
    pub const ADMIN_DASHBOARD: &str = "/admin-dashboard";
}

/// RoleResolver
///
/// Maps a principal to its role by probing the three profile tables in a fixed order:
/// user profile (by id), then trainer profile (by id), then admin record (by email).
/// The first hit wins and later tables are not queried.
///
/// The tables are assumed to be disjoint. If a principal has rows in several of them,
/// the order above decides; that situation is a data problem upstream and is only
/// logged here.
///
/// A failing lookup counts as "no row" for that table and the probe moves on, so an
/// outage of one table never hides a match in another. When every table fails the
/// principal is simply unresolved.
#[derive(Clone)]
pub struct RoleResolver {
    repo: RepositoryState,
}

impl RoleResolver {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    /// resolve
    ///
    /// Returns `None` when the principal is authenticated but has no profile anywhere
    /// (or nothing could be read). Read-only.
    pub async fn resolve(&self, principal: &Principal) -> Option<RoleRecord> {
        match self.repo.find_user_profile(principal.id).await {
            Ok(Some(profile)) => {
                tracing::debug!(principal = %principal.id, "resolved as user");
                return Some(RoleRecord::User(profile));
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(principal = %principal.id, error = %e, "user profile lookup failed; treating as not found");
            }
        }

        match self.repo.find_trainer_profile(principal.id).await {
            Ok(Some(profile)) => {
                tracing::debug!(principal = %principal.id, status = ?profile.status, "resolved as trainer");
                return Some(RoleRecord::Trainer(profile));
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(principal = %principal.id, error = %e, "trainer profile lookup failed; treating as not found");
            }
        }

        let email = principal.email.as_deref()?;
        match self.repo.find_admin_by_email(email).await {
            Ok(Some(admin)) => {
                tracing::debug!(principal = %principal.id, "resolved as admin");
                Some(RoleRecord::Admin(admin))
            }
            Ok(None) => {
                tracing::info!(principal = %principal.id, "principal has no role");
                None
            }
            Err(e) => {
                tracing::warn!(principal = %principal.id, error = %e, "admin lookup failed; treating as not found");
                None
            }
        }
    }
}

/// redirect_path
///
/// The landing page for a resolved (or unresolved) principal. Trainers still under
/// review go to the pending dashboard; any other trainer status, including a missing
/// one, lands on the regular trainer dashboard.
pub fn redirect_path(record: Option<&RoleRecord>) -> &'static str {
    match record {
        Some(RoleRecord::User(_)) => paths::USER_DASHBOARD,
        Some(RoleRecord::Trainer(profile)) => match profile.status {
            Some(TrainerStatus::Pending) => paths::PENDING_TRAINER_DASHBOARD,
            _ => paths::TRAINER_DASHBOARD,
        },
        Some(RoleRecord::Admin(_)) => paths::ADMIN_DASHBOARD,
        None => paths::UNAUTHORIZED,
    }
}
