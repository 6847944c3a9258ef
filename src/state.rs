// src/state.rs
use crate::config::EnrollmentPolicy;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub policy: EnrollmentPolicy,
}

// Lets handlers extract the DB pool directly
impl axum::extract::FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> SqlitePool {
        state.db_pool.clone()
    }
}

impl axum::extract::FromRef<AppState> for EnrollmentPolicy {
    fn from_ref(state: &AppState) -> EnrollmentPolicy {
        state.policy
    }
}
