use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Identity ---

/// Principal
///
/// The authenticated identity issued by the external auth provider (Supabase GoTrue).
/// The application never creates or destroys principals; it only observes them through
/// verified access tokens or auth API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Principal {
    // auth.users.id, shared as primary key by user_profiles and trainer_profiles.
    pub id: Uuid,
    // Admins are looked up by email, so a principal without one can never resolve to admin.
    pub email: Option<String>,
}

/// Role
///
/// The three disjoint roles of the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    User,
    Trainer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Trainer => "trainer",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// TrainerStatus
///
/// Review state of a trainer application. Rows are created as `pending`; the approval
/// workflow that moves them to `approved`/`rejected` lives outside this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum TrainerStatus {
    Pending,
    Approved,
    Rejected,
}

impl TrainerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrainerStatus::Pending => "pending",
            TrainerStatus::Approved => "approved",
            TrainerStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for TrainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrainerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(TrainerStatus::Pending),
            "approved" => Ok(TrainerStatus::Approved),
            "rejected" => Ok(TrainerStatus::Rejected),
            other => Err(format!("unknown trainer status '{}'", other)),
        }
    }
}

// --- Database Enumerations (public schema) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type)]
#[sqlx(type_name = "gender_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Gender {
    Male,
    Female,
    Other,
    PreferNotToSay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type)]
#[sqlx(type_name = "experience_level", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type)]
#[sqlx(type_name = "time_preference", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum TimePreference {
    Morning,
    Afternoon,
    Evening,
    Flexible,
}

// --- Profile Rows ---

/// UserProfile
///
/// A client's profile from `public.user_profiles`, keyed by the principal id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub full_name: String,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub fitness_goals: Option<Vec<String>>,
    pub preferred_workout_type: Option<String>,
    pub time_preference: Option<TimePreference>,
    pub health_conditions: Option<String>,
    pub experience_level: Option<ExperienceLevel>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// TrainerProfile
///
/// A trainer's profile from `public.trainer_profiles`, keyed by the principal id.
///
/// `status` is a free-text column in the database. Values outside the known set are
/// read as `None`, which the redirect policy treats the same as a missing status.
/// `FromRow` is implemented by hand in the repository for that reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TrainerProfile {
    pub id: Uuid,
    pub full_name: String,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub services_offered: Option<Vec<String>>,
    pub years_experience: Option<f64>,
    pub career_motivation: Option<String>,
    // Storage object keys produced by the presigned upload flow.
    pub certification_files: Option<Vec<String>>,
    pub govt_id_file: Option<String>,
    pub availability_timings: Option<Vec<String>>,
    pub offers_home_visits: Option<bool>,
    pub offers_online_sessions: Option<bool>,
    pub status: Option<TrainerStatus>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// AdminRecord
///
/// A row from `public.admins`. Matched by email, not by principal id.
/// The table's password hash is deliberately absent from this struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct AdminRecord {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub role: Option<String>,
    #[ts(type = "string | null")]
    pub created_at: Option<DateTime<Utc>>,
    #[ts(type = "string | null")]
    pub last_login: Option<DateTime<Utc>>,
}

/// RoleRecord
///
/// The resolved role of a principal together with the stored profile that proved it.
/// Computed per session change (or per request), never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "role", content = "profile", rename_all = "lowercase")]
#[ts(export)]
pub enum RoleRecord {
    User(UserProfile),
    Trainer(TrainerProfile),
    Admin(AdminRecord),
}

impl RoleRecord {
    pub fn role(&self) -> Role {
        match self {
            RoleRecord::User(_) => Role::User,
            RoleRecord::Trainer(_) => Role::Trainer,
            RoleRecord::Admin(_) => Role::Admin,
        }
    }

    /// Only trainers carry a review status.
    pub fn trainer_status(&self) -> Option<TrainerStatus> {
        match self {
            RoleRecord::Trainer(profile) => profile.status,
            _ => None,
        }
    }
}

// --- Request Payloads (Input Schemas) ---

/// Credentials
///
/// Email/password pair forwarded to the auth provider. Never persisted or logged here.
#[derive(Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// UserSignupData
///
/// Everything the three-step client wizard collects besides credentials.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserSignupData {
    pub full_name: String,
    pub age: i32,
    pub gender: Gender,
    pub fitness_goals: Vec<String>,
    pub preferred_workout_type: String,
    pub time_preference: TimePreference,
    #[serde(default)]
    pub health_conditions: Option<String>,
    pub experience_level: ExperienceLevel,
    pub city: String,
    pub phone: String,
}

/// TrainerSignupData
///
/// Everything the three-step trainer wizard collects besides credentials.
/// Document fields hold storage keys, not file contents.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TrainerSignupData {
    pub full_name: String,
    pub age: i32,
    pub gender: Gender,
    pub services_offered: Vec<String>,
    pub years_experience: f64,
    pub city: String,
    pub career_motivation: String,
    #[serde(default)]
    pub certification_files: Vec<String>,
    #[serde(default)]
    pub govt_id_file: Option<String>,
    pub availability_timings: Vec<String>,
    #[serde(default)]
    pub offers_home_visits: bool,
    #[serde(default)]
    pub offers_online_sessions: bool,
    pub phone: String,
}

/// SignupProfile
///
/// The role-specific half of a signup. Discriminated by `role` on the wire, so the
/// form data is never an untyped bag once it reaches the server.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "role", rename_all = "lowercase")]
#[ts(export)]
pub enum SignupProfile {
    User(UserSignupData),
    Trainer(TrainerSignupData),
}

impl SignupProfile {
    pub fn role(&self) -> Role {
        match self {
            SignupProfile::User(_) => Role::User,
            SignupProfile::Trainer(_) => Role::Trainer,
        }
    }
}

/// SignupRequest
///
/// Input payload for POST /auth/signup.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SignupRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
    pub profile: SignupProfile,
}

impl SignupRequest {
    /// validate
    ///
    /// Server-side counterpart of the signup wizards' per-step rules. Returns the first
    /// violation as a message suitable for a user-facing notification.
    pub fn validate(&self) -> Result<(), String> {
        let email = self.credentials.email.trim();
        let valid_email = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !valid_email {
            return Err("Please enter a valid email address".to_string());
        }
        if self.credentials.password.chars().count() < 6 {
            return Err("Password must be at least 6 characters".to_string());
        }

        match &self.profile {
            SignupProfile::User(data) => {
                check_full_name(&data.full_name)?;
                if !(16..=100).contains(&data.age) {
                    return Err("Age must be between 16 and 100".to_string());
                }
                if data.fitness_goals.is_empty() {
                    return Err("Please select at least one fitness goal".to_string());
                }
                if data.preferred_workout_type.trim().is_empty() {
                    return Err("Please select a preferred workout type".to_string());
                }
                if data.city.trim().chars().count() < 2 {
                    return Err("City is required".to_string());
                }
                check_phone(&data.phone)?;
            }
            SignupProfile::Trainer(data) => {
                check_full_name(&data.full_name)?;
                if !(18..=100).contains(&data.age) {
                    return Err("Age must be between 18 and 100".to_string());
                }
                if data.services_offered.is_empty() {
                    return Err("Please select at least one service".to_string());
                }
                if !(0.0..=50.0).contains(&data.years_experience) {
                    return Err("Years of experience must be between 0 and 50".to_string());
                }
                if data.city.trim().is_empty() {
                    return Err("City is required".to_string());
                }
                if data.career_motivation.trim().chars().count() < 20 {
                    return Err(
                        "Please provide more details about your motivation (at least 20 characters)"
                            .to_string(),
                    );
                }
                if data.certification_files.is_empty() {
                    return Err("Please upload at least one certification document".to_string());
                }
                if data.govt_id_file.as_deref().is_none_or(|key| key.trim().is_empty()) {
                    return Err("Please upload a government ID document".to_string());
                }
                if data.availability_timings.is_empty() {
                    return Err("Please select at least one availability time".to_string());
                }
                check_phone(&data.phone)?;
            }
        }
        Ok(())
    }
}

fn check_full_name(full_name: &str) -> Result<(), String> {
    if full_name.trim().chars().count() < 2 {
        return Err("Full name is required".to_string());
    }
    Ok(())
}

fn check_phone(phone: &str) -> Result<(), String> {
    if phone.trim().chars().count() < 10 {
        return Err("Phone number must be at least 10 digits".to_string());
    }
    Ok(())
}

/// RefreshRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// TrainerListFilter
///
/// Query parameters for GET /admin/trainers.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TrainerListFilter {
    pub status: Option<TrainerStatus>,
}

/// GuardQuery
///
/// Query parameters for GET /guard.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GuardQuery {
    /// The SPA path the browser is about to render, e.g. `/trainer-dashboard`.
    pub path: String,
}

/// DocumentUploadRequest
///
/// Input payload for requesting a presigned upload URL for a trainer credential document.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct DocumentUploadRequest {
    /// The original filename, used to derive the file extension.
    #[schema(example = "first_aid_certificate.pdf")]
    pub filename: String,
    /// The MIME type the upload will be constrained to.
    #[schema(example = "application/pdf")]
    pub file_type: String,
    /// Exact size of the file; the signed PUT only accepts this length.
    #[schema(example = 482_133)]
    #[ts(type = "number")]
    pub size_bytes: u64,
}

// --- Output Schemas ---

/// SessionTokens
///
/// Tokens issued by the auth provider. Absent after signup when email confirmation is on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// SessionSummary
///
/// What the SPA needs after login, signup, refresh, or GET /me: who the principal is,
/// which role they resolved to, and where to send them.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionSummary {
    pub principal: Principal,
    pub role: Option<Role>,
    pub trainer_status: Option<TrainerStatus>,
    pub record: Option<RoleRecord>,
    pub redirect_to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<SessionTokens>,
}

/// AdminDashboardStats
///
/// Output schema for GET /admin/stats. Every trainer count is derived from the
/// `status` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct AdminDashboardStats {
    pub total_users: i64,
    pub total_trainers: i64,
    pub pending_trainers: i64,
    pub approved_trainers: i64,
    pub rejected_trainers: i64,
}

/// GuardResponse
///
/// Output schema for GET /guard. `decision` is `loading`, `render` or `redirect`;
/// `redirect_to` is set only for redirects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct GuardResponse {
    pub path: String,
    pub decision: String,
    pub redirect_to: Option<String>,
    pub role: Option<Role>,
}

/// DocumentUploadResponse
///
/// The time-limited PUT URL plus the object key the trainer profile will reference.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct DocumentUploadResponse {
    pub upload_url: String,
    pub resource_key: String,
}
