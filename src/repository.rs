use crate::models::{
    AdminDashboardStats, AdminRecord, TrainerProfile, TrainerSignupData, TrainerStatus,
    UserProfile, UserSignupData,
};
use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Row, postgres::PgRow};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// RepoError
///
/// Failure of a profile store call. Role resolution swallows these per table;
/// write and aggregate paths propagate them to the handler.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Used by non-Postgres implementations (and test doubles) to report an outage.
    #[error("profile store unavailable: {0}")]
    Unavailable(String),
}

/// Repository Trait
///
/// The profile store collaborator: three independent keyed tables (`user_profiles`,
/// `trainer_profiles`, `admins`) plus the writes performed at signup and the read-only
/// aggregates shown on the admin dashboard.
///
/// Lookups return `Ok(None)` for "no row". An `Err` means the store could not answer.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Role Lookups ---
    async fn find_user_profile(&self, id: Uuid) -> Result<Option<UserProfile>, RepoError>;
    async fn find_trainer_profile(&self, id: Uuid) -> Result<Option<TrainerProfile>, RepoError>;
    // Admins are keyed by email, not by auth id.
    async fn find_admin_by_email(&self, email: &str) -> Result<Option<AdminRecord>, RepoError>;

    // --- Signup ---
    async fn create_user_profile(
        &self,
        id: Uuid,
        data: &UserSignupData,
    ) -> Result<UserProfile, RepoError>;
    // Always inserts with status = 'pending'.
    async fn create_trainer_profile(
        &self,
        id: Uuid,
        data: &TrainerSignupData,
    ) -> Result<TrainerProfile, RepoError>;

    // --- Admin (read-only) ---
    async fn get_stats(&self) -> Result<AdminDashboardStats, RepoError>;
    async fn list_trainers(
        &self,
        status: Option<TrainerStatus>,
    ) -> Result<Vec<TrainerProfile>, RepoError>;
}

/// RepositoryState
///
/// The concrete type used to share the profile store across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const USER_COLUMNS: &str = "id, full_name, age, gender, phone, city, fitness_goals, \
     preferred_workout_type, time_preference, health_conditions, experience_level, \
     created_at, updated_at";

// years_experience is cast so the row decodes whether the column is integer or numeric.
const TRAINER_COLUMNS: &str = "id, full_name, age, gender, phone, city, services_offered, \
     years_experience::float8 AS years_experience, career_motivation, certification_files, \
     govt_id_file, availability_timings, offers_home_visits, offers_online_sessions, status, \
     created_at, updated_at";

const ADMIN_COLUMNS: &str =
    "id, email, full_name, phone_number, role, created_at, last_login";

impl<'r> FromRow<'r, PgRow> for TrainerProfile {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let status: Option<String> = row.try_get("status")?;
        Ok(TrainerProfile {
            id: row.try_get("id")?,
            full_name: row.try_get("full_name")?,
            age: row.try_get("age")?,
            gender: row.try_get("gender")?,
            phone: row.try_get("phone")?,
            city: row.try_get("city")?,
            services_offered: row.try_get("services_offered")?,
            years_experience: row.try_get("years_experience")?,
            career_motivation: row.try_get("career_motivation")?,
            certification_files: row.try_get("certification_files")?,
            govt_id_file: row.try_get("govt_id_file")?,
            availability_timings: row.try_get("availability_timings")?,
            offers_home_visits: row.try_get("offers_home_visits")?,
            offers_online_sessions: row.try_get("offers_online_sessions")?,
            // Unknown values degrade to "no status" instead of failing the whole row.
            status: status.as_deref().and_then(|s| s.parse().ok()),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// PostgresRepository
///
/// `Repository` backed by the Supabase Postgres database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_user_profile(&self, id: Uuid) -> Result<Option<UserProfile>, RepoError> {
        let query = format!("SELECT {USER_COLUMNS} FROM user_profiles WHERE id = $1");
        let row = sqlx::query_as::<_, UserProfile>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_trainer_profile(&self, id: Uuid) -> Result<Option<TrainerProfile>, RepoError> {
        let query = format!("SELECT {TRAINER_COLUMNS} FROM trainer_profiles WHERE id = $1");
        let row = sqlx::query_as::<_, TrainerProfile>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// find_admin_by_email
    ///
    /// Exact match on `admins.email`. `LIMIT 1` keeps a duplicated email from turning
    /// into an error.
    async fn find_admin_by_email(&self, email: &str) -> Result<Option<AdminRecord>, RepoError> {
        let query = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE email = $1 LIMIT 1");
        let row = sqlx::query_as::<_, AdminRecord>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// create_user_profile
    ///
    /// Mirrors the freshly created auth user into `public.user_profiles`, sharing its id.
    async fn create_user_profile(
        &self,
        id: Uuid,
        data: &UserSignupData,
    ) -> Result<UserProfile, RepoError> {
        let query = format!(
            "INSERT INTO user_profiles (id, full_name, age, gender, phone, city, fitness_goals, \
             preferred_workout_type, time_preference, health_conditions, experience_level) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {USER_COLUMNS}"
        );
        let profile = sqlx::query_as::<_, UserProfile>(&query)
            .bind(id)
            .bind(&data.full_name)
            .bind(data.age)
            .bind(data.gender)
            .bind(&data.phone)
            .bind(&data.city)
            .bind(&data.fitness_goals)
            .bind(&data.preferred_workout_type)
            .bind(data.time_preference)
            .bind(&data.health_conditions)
            .bind(data.experience_level)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!(user_id = %id, "user profile created");
        Ok(profile)
    }

    /// create_trainer_profile
    ///
    /// Inserts the trainer application. The status is fixed to `pending`; only the
    /// external approval workflow changes it afterwards.
    async fn create_trainer_profile(
        &self,
        id: Uuid,
        data: &TrainerSignupData,
    ) -> Result<TrainerProfile, RepoError> {
        let query = format!(
            "INSERT INTO trainer_profiles (id, full_name, age, gender, phone, city, \
             services_offered, years_experience, career_motivation, certification_files, \
             govt_id_file, availability_timings, offers_home_visits, offers_online_sessions, \
             role, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, 'trainer', $15) \
             RETURNING {TRAINER_COLUMNS}"
        );
        let profile = sqlx::query_as::<_, TrainerProfile>(&query)
            .bind(id)
            .bind(&data.full_name)
            .bind(data.age)
            .bind(data.gender)
            .bind(&data.phone)
            .bind(&data.city)
            .bind(&data.services_offered)
            .bind(data.years_experience)
            .bind(&data.career_motivation)
            .bind(&data.certification_files)
            .bind(&data.govt_id_file)
            .bind(&data.availability_timings)
            .bind(data.offers_home_visits)
            .bind(data.offers_online_sessions)
            .bind(TrainerStatus::Pending.as_str())
            .fetch_one(&self.pool)
            .await?;

        tracing::info!(trainer_id = %id, "trainer application created (pending)");
        Ok(profile)
    }

    /// get_stats
    ///
    /// All dashboard counters in one round trip. Trainer counts come from the `status`
    /// column; nothing here is a placeholder.
    async fn get_stats(&self) -> Result<AdminDashboardStats, RepoError> {
        let stats = sqlx::query_as::<_, AdminDashboardStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM user_profiles) AS total_users,
                (SELECT COUNT(*) FROM trainer_profiles) AS total_trainers,
                (SELECT COUNT(*) FROM trainer_profiles WHERE lower(status) = 'pending') AS pending_trainers,
                (SELECT COUNT(*) FROM trainer_profiles WHERE lower(status) = 'approved') AS approved_trainers,
                (SELECT COUNT(*) FROM trainer_profiles WHERE lower(status) = 'rejected') AS rejected_trainers
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }

    async fn list_trainers(
        &self,
        status: Option<TrainerStatus>,
    ) -> Result<Vec<TrainerProfile>, RepoError> {
        let query = format!(
            "SELECT {TRAINER_COLUMNS} FROM trainer_profiles \
             WHERE ($1::text IS NULL OR lower(status) = $1) \
             ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, TrainerProfile>(&query)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
