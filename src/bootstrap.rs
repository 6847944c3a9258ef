// src/bootstrap.rs
use crate::{
    config::AdminSeed,
    error::AppResult,
    models::user::Role,
    services::user_service,
};
use sqlx::SqlitePool;

/// Creates the configured administrator unless an account with that email
/// already exists. Safe to run on every start.
pub async fn ensure_admin(db_pool: &SqlitePool, seed: Option<&AdminSeed>) -> AppResult<bool> {
    let Some(seed) = seed else {
        tracing::info!("ADMIN_EMAIL/ADMIN_PASSWORD not set, skipping admin bootstrap.");
        return Ok(false);
    };

    if let Some(existing) = user_service::find_user_by_email(db_pool, &seed.email).await? {
        if existing.role != Role::Admin {
            tracing::warn!(
                "Bootstrap account {} exists with role '{}', leaving it unchanged.",
                seed.email,
                existing.role
            );
        } else {
            tracing::debug!("Admin {} already present.", seed.email);
        }
        return Ok(false);
    }

    user_service::create_user(db_pool, &seed.username, &seed.email, &seed.password, Role::Admin).await?;
    tracing::info!("👑 Admin account {} created.", seed.email);
    Ok(true)
}
