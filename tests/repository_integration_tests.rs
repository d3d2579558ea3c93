//! Runs against a real Postgres. `DATABASE_URL` must point at a disposable database:
//! `cargo test --test repository_integration_tests -- --ignored`

use sqlx::PgPool;
use uuid::Uuid;
use vyayam_portal::{
    models::{
        ExperienceLevel, Gender, TimePreference, TrainerSignupData, TrainerStatus, UserSignupData,
    },
    repository::{PostgresRepository, Repository},
};

// --- Test Context and Setup ---

struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool }
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

// --- Test Data Helpers ---

fn user_data() -> UserSignupData {
    UserSignupData {
        full_name: "Asha Rao".to_string(),
        age: 29,
        gender: Gender::Female,
        fitness_goals: vec!["weight_loss".to_string(), "flexibility".to_string()],
        preferred_workout_type: "yoga".to_string(),
        time_preference: TimePreference::Morning,
        health_conditions: None,
        experience_level: ExperienceLevel::Beginner,
        city: "Pune".to_string(),
        phone: "9123456780".to_string(),
    }
}

fn trainer_data() -> TrainerSignupData {
    TrainerSignupData {
        full_name: "Vikram Singh".to_string(),
        age: 34,
        gender: Gender::Male,
        services_offered: vec!["strength".to_string()],
        years_experience: 6.5,
        city: "Mumbai".to_string(),
        career_motivation: "I want to help people build lasting habits.".to_string(),
        certification_files: vec!["trainers/x/documents/cert.pdf".to_string()],
        govt_id_file: Some("trainers/x/documents/id.png".to_string()),
        availability_timings: vec!["morning".to_string()],
        offers_home_visits: true,
        offers_online_sessions: false,
        phone: "9876543210".to_string(),
    }
}

async fn set_trainer_status(pool: &PgPool, id: Uuid, status: &str) {
    sqlx::query("UPDATE trainer_profiles SET status = $2 WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(pool)
        .await
        .expect("Failed to update trainer status");
}

async fn create_admin(pool: &PgPool, email: &str) {
    sqlx::query(
        "INSERT INTO admins (email, full_name, password_hash) VALUES ($1, 'Site Admin', 'x') \
         ON CONFLICT (email) DO NOTHING",
    )
    .bind(email)
    .execute(pool)
    .await
    .expect("Failed to create admin");
}

// --- Tests ---

#[tokio::test]
#[ignore]
async fn test_user_profile_roundtrip() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let id = Uuid::new_v4();

    let created = repo.create_user_profile(id, &user_data()).await.unwrap();
    assert_eq!(created.id, id);
    assert_eq!(created.gender, Some(Gender::Female));

    let found = repo.find_user_profile(id).await.unwrap().unwrap();
    assert_eq!(found.full_name, "Asha Rao");
    assert_eq!(found.fitness_goals.unwrap().len(), 2);

    assert!(repo.find_trainer_profile(id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
async fn test_trainer_profile_created_pending() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let id = Uuid::new_v4();

    let created = repo.create_trainer_profile(id, &trainer_data()).await.unwrap();
    assert_eq!(created.status, Some(TrainerStatus::Pending));
    assert_eq!(created.years_experience, Some(6.5));

    set_trainer_status(&ctx.pool, id, "Approved").await;
    let found = repo.find_trainer_profile(id).await.unwrap().unwrap();
    assert_eq!(found.status, Some(TrainerStatus::Approved));
}

#[tokio::test]
#[ignore]
async fn test_unknown_trainer_status_reads_as_none() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let id = Uuid::new_v4();

    repo.create_trainer_profile(id, &trainer_data()).await.unwrap();
    set_trainer_status(&ctx.pool, id, "on_hold").await;

    let found = repo.find_trainer_profile(id).await.unwrap().unwrap();
    assert_eq!(found.status, None);
}

#[tokio::test]
#[ignore]
async fn test_admin_lookup_by_email() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let email = format!("admin-{}@x.com", Uuid::new_v4());

    create_admin(&ctx.pool, &email).await;

    let admin = repo.find_admin_by_email(&email).await.unwrap().unwrap();
    assert_eq!(admin.email, email);
    assert!(repo.find_admin_by_email("missing@x.com").await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
async fn test_stats_count_trainers_by_status() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let before = repo.get_stats().await.unwrap();

    let pending = Uuid::new_v4();
    let approved = Uuid::new_v4();
    repo.create_trainer_profile(pending, &trainer_data()).await.unwrap();
    repo.create_trainer_profile(approved, &trainer_data()).await.unwrap();
    set_trainer_status(&ctx.pool, approved, "approved").await;

    let after = repo.get_stats().await.unwrap();
    assert_eq!(after.total_trainers - before.total_trainers, 2);
    assert_eq!(after.pending_trainers - before.pending_trainers, 1);
    assert_eq!(after.approved_trainers - before.approved_trainers, 1);
}

#[tokio::test]
#[ignore]
async fn test_list_trainers_filtered_by_status() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let id = Uuid::new_v4();

    repo.create_trainer_profile(id, &trainer_data()).await.unwrap();
    set_trainer_status(&ctx.pool, id, "rejected").await;

    let rejected = repo.list_trainers(Some(TrainerStatus::Rejected)).await.unwrap();
    assert!(rejected.iter().any(|t| t.id == id));
    assert!(rejected.iter().all(|t| t.status == Some(TrainerStatus::Rejected)));

    let pending = repo.list_trainers(Some(TrainerStatus::Pending)).await.unwrap();
    assert!(pending.iter().all(|t| t.id != id));
}
