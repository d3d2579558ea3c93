#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use std::{
    sync::{Arc, Mutex},
    time::SystemTime,
};
use uuid::Uuid;
use vyayam_portal::{
    AppState,
    auth::Claims,
    config::AppConfig,
    models::{
        AdminDashboardStats, AdminRecord, Credentials, Gender, Principal, SessionTokens,
        TrainerProfile, TrainerSignupData, TrainerStatus, UserProfile, UserSignupData,
    },
    repository::{RepoError, Repository, RepositoryState},
    storage::{MockStorageService, StorageState},
    supabase::{AuthError, AuthProvider, AuthProviderState, AuthSession},
};

// --- Fixtures ---

pub fn principal(email: Option<&str>) -> Principal {
    Principal {
        id: Uuid::new_v4(),
        email: email.map(str::to_string),
    }
}

pub fn user_profile(id: Uuid) -> UserProfile {
    UserProfile {
        id,
        full_name: "Asha Rao".to_string(),
        age: Some(29),
        gender: Some(Gender::Female),
        phone: None,
        city: Some("Pune".to_string()),
        fitness_goals: Some(vec!["weight_loss".to_string()]),
        preferred_workout_type: Some("yoga".to_string()),
        time_preference: None,
        health_conditions: None,
        experience_level: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn trainer_profile(id: Uuid, status: Option<TrainerStatus>) -> TrainerProfile {
    TrainerProfile {
        id,
        full_name: "Vikram Singh".to_string(),
        age: Some(34),
        gender: Some(Gender::Male),
        phone: Some("9876543210".to_string()),
        city: Some("Mumbai".to_string()),
        services_offered: Some(vec!["strength".to_string()]),
        years_experience: Some(6.0),
        career_motivation: Some("Helping people build lasting habits".to_string()),
        certification_files: Some(vec![]),
        govt_id_file: None,
        availability_timings: Some(vec!["morning".to_string()]),
        offers_home_visits: Some(true),
        offers_online_sessions: Some(false),
        status,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn admin_record(email: &str) -> AdminRecord {
    AdminRecord {
        id: Uuid::new_v4(),
        email: email.to_string(),
        full_name: "Site Admin".to_string(),
        phone_number: None,
        role: Some("admin".to_string()),
        created_at: Some(Utc::now()),
        last_login: None,
    }
}

// --- Mock Profile Store ---

/// In-memory profile store that records every call it receives.
#[derive(Default)]
pub struct MockRepo {
    pub users: Vec<UserProfile>,
    pub trainers: Vec<TrainerProfile>,
    pub admins: Vec<AdminRecord>,
    pub fail_user_lookup: bool,
    pub fail_trainer_lookup: bool,
    pub fail_admin_lookup: bool,
    pub fail_inserts: bool,
    pub fail_admin_reads: bool,
    pub stats: AdminDashboardStats,
    pub calls: Mutex<Vec<String>>,
}

impl MockRepo {
    pub fn with_user(mut self, profile: UserProfile) -> Self {
        self.users.push(profile);
        self
    }

    pub fn with_trainer(mut self, profile: TrainerProfile) -> Self {
        self.trainers.push(profile);
        self
    }

    pub fn with_admin(mut self, admin: AdminRecord) -> Self {
        self.admins.push(admin);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

fn outage() -> RepoError {
    RepoError::Unavailable("connection refused".to_string())
}

#[async_trait]
impl Repository for MockRepo {
    async fn find_user_profile(&self, id: Uuid) -> Result<Option<UserProfile>, RepoError> {
        self.record("user".to_string());
        if self.fail_user_lookup {
            return Err(outage());
        }
        Ok(self.users.iter().find(|p| p.id == id).cloned())
    }

    async fn find_trainer_profile(&self, id: Uuid) -> Result<Option<TrainerProfile>, RepoError> {
        self.record("trainer".to_string());
        if self.fail_trainer_lookup {
            return Err(outage());
        }
        Ok(self.trainers.iter().find(|p| p.id == id).cloned())
    }

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<AdminRecord>, RepoError> {
        self.record("admin".to_string());
        if self.fail_admin_lookup {
            return Err(outage());
        }
        Ok(self.admins.iter().find(|a| a.email == email).cloned())
    }

    async fn create_user_profile(
        &self,
        id: Uuid,
        data: &UserSignupData,
    ) -> Result<UserProfile, RepoError> {
        self.record("create_user".to_string());
        if self.fail_inserts {
            return Err(outage());
        }
        let mut profile = user_profile(id);
        profile.full_name = data.full_name.clone();
        profile.age = Some(data.age);
        Ok(profile)
    }

    async fn create_trainer_profile(
        &self,
        id: Uuid,
        data: &TrainerSignupData,
    ) -> Result<TrainerProfile, RepoError> {
        self.record("create_trainer".to_string());
        if self.fail_inserts {
            return Err(outage());
        }
        let mut profile = trainer_profile(id, Some(TrainerStatus::Pending));
        profile.full_name = data.full_name.clone();
        Ok(profile)
    }

    async fn get_stats(&self) -> Result<AdminDashboardStats, RepoError> {
        self.record("stats".to_string());
        if self.fail_admin_reads {
            return Err(outage());
        }
        Ok(self.stats.clone())
    }

    async fn list_trainers(
        &self,
        status: Option<TrainerStatus>,
    ) -> Result<Vec<TrainerProfile>, RepoError> {
        self.record(format!("list_trainers:{:?}", status));
        if self.fail_admin_reads {
            return Err(outage());
        }
        Ok(self
            .trainers
            .iter()
            .filter(|t| status.is_none() || t.status == status)
            .cloned()
            .collect())
    }
}

// --- Mock Auth Provider ---

/// Auth provider double. Answers every call with `principal`, or with a provider
/// rejection when `reject` is set.
pub struct MockAuth {
    pub principal: Principal,
    pub issue_tokens: bool,
    pub reject: Option<(u16, String)>,
    pub calls: Mutex<Vec<String>>,
}

impl MockAuth {
    pub fn new(principal: Principal) -> Self {
        Self {
            principal,
            issue_tokens: true,
            reject: None,
            calls: Mutex::new(vec![]),
        }
    }

    pub fn rejecting(status: u16, message: &str) -> Self {
        Self {
            reject: Some((status, message.to_string())),
            ..Self::new(principal(None))
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(&self, call: String) -> Result<AuthSession, AuthError> {
        self.calls.lock().unwrap().push(call);
        if let Some((status, message)) = &self.reject {
            return Err(AuthError::Rejected {
                status: *status,
                message: message.clone(),
            });
        }
        Ok(AuthSession {
            principal: self.principal.clone(),
            tokens: self.issue_tokens.then(|| SessionTokens {
                access_token: "access-token".to_string(),
                refresh_token: "refresh-token".to_string(),
                expires_in: 3600,
            }),
        })
    }
}

#[async_trait]
impl AuthProvider for MockAuth {
    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthSession, AuthError> {
        self.answer(format!("sign_up:{}", credentials.email))
    }

    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthSession, AuthError> {
        self.answer(format!("sign_in:{}", credentials.email))
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        self.answer(format!("refresh:{}", refresh_token))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.answer(format!("sign_out:{}", access_token)).map(|_| ())
    }
}

// --- State & Tokens ---

pub fn app_state(repo: Arc<MockRepo>, auth: Arc<MockAuth>) -> AppState {
    app_state_with_storage(repo, auth, MockStorageService::new())
}

pub fn app_state_with_storage(
    repo: Arc<MockRepo>,
    auth: Arc<MockAuth>,
    storage: MockStorageService,
) -> AppState {
    AppState {
        repo: repo as RepositoryState,
        auth: auth as AuthProviderState,
        storage: Arc::new(storage) as StorageState,
        config: AppConfig::default(),
    }
}

fn now() -> usize {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

/// Signs a Supabase-shaped access token. `ttl_secs` may be negative for an expired one.
pub fn create_token(principal: &Principal, aud: &str, secret: &str, ttl_secs: i64) -> String {
    let iat = now();
    let claims = Claims {
        sub: principal.id,
        email: principal.email.clone(),
        aud: aud.to_string(),
        exp: (iat as i64 + ttl_secs) as usize,
        iat,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}
