// src/services/user_service.rs
use crate::{
    error::{is_unique_violation, AppError, AppResult},
    models::user::{Role, User},
    services::auth_service,
};
use sqlx::{Sqlite, SqlitePool};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, role, is_synthetic, created_at, updated_at";

/// Looks up a user by primary key.
pub async fn find_user_by_id(db_pool: &SqlitePool, user_id: i64) -> AppResult<Option<User>> {
    tracing::debug!("Looking up user by id: {}", user_id);
    let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS))
        .bind(user_id)
        .fetch_optional(db_pool)
        .await?;

    if user.is_none() {
        tracing::debug!("User {} not found.", user_id);
    }
    Ok(user)
}

/// Looks up a user by email (case-insensitive, the column is COLLATE NOCASE).
pub async fn find_user_by_email(db_pool: &SqlitePool, email: &str) -> AppResult<Option<User>> {
    tracing::debug!("Looking up user by email: {}", email);
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE email = ?1",
        USER_COLUMNS
    ))
    .bind(email.trim())
    .fetch_optional(db_pool)
    .await?;
    Ok(user)
}

/// All real (non-synthetic) accounts, for the admin user list.
pub async fn find_all_users(db_pool: &SqlitePool) -> AppResult<Vec<User>> {
    tracing::debug!("Loading all users...");
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE is_synthetic = 0 ORDER BY id ASC",
        USER_COLUMNS
    ))
    .fetch_all(db_pool)
    .await?;
    tracing::debug!("Found {} users.", users.len());
    Ok(users)
}

/// Verifies an email/password pair and returns the matching user.
pub async fn authenticate(db_pool: &SqlitePool, email: &str, password: &str) -> AppResult<User> {
    let Some(user) = find_user_by_email(db_pool, email).await? else {
        tracing::warn!("Login failed: no account for {}", email);
        return Err(AppError::InvalidCredentials);
    };

    if user.is_synthetic {
        tracing::warn!("Login refused for synthetic account {}", user.id);
        return Err(AppError::InvalidCredentials);
    }

    if auth_service::verify_password(password, &user.password_hash).await? {
        Ok(user)
    } else {
        tracing::warn!("Login failed: wrong password for {}", email);
        Err(AppError::InvalidCredentials)
    }
}

/// Creates an account from a raw password. Returns the new user id.
pub async fn create_user(
    db_pool: &SqlitePool,
    username: &str,
    email: &str,
    raw_password: &str,
    role: Role,
) -> AppResult<i64> {
    tracing::info!("Creating {} account for {}", role, email);
    let password_hash = auth_service::hash_password(raw_password).await?;
    let id = insert_user(db_pool, username, email, &password_hash, role, false).await?;
    tracing::info!("✅ User {} ({}) created.", id, email);
    Ok(id)
}

/// Inserts a user row with an already hashed password. Works on a pool or
/// inside a transaction.
pub async fn insert_user<'e, E>(
    executor: E,
    username: &str,
    email: &str,
    password_hash: &str,
    role: Role,
    is_synthetic: bool,
) -> AppResult<i64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO users (username, email, password_hash, role, is_synthetic)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(username.trim())
    .bind(email.trim())
    .bind(password_hash)
    .bind(role)
    .bind(is_synthetic)
    .execute(executor)
    .await;

    match result {
        Ok(done) => Ok(done.last_insert_rowid()),
        Err(e) if is_unique_violation(&e) => {
            tracing::warn!("Email '{}' is already registered.", email);
            Err(AppError::DuplicateEmail)
        }
        Err(e) => Err(e.into()),
    }
}

/// Updates username and email; replaces the password only when one is given.
pub async fn update_profile(
    db_pool: &SqlitePool,
    user_id: i64,
    username: &str,
    email: &str,
    new_password: Option<&str>,
) -> AppResult<()> {
    tracing::info!("Updating profile of user {}", user_id);

    let new_hash = match new_password {
        Some(raw) => Some(auth_service::hash_password(raw).await?),
        None => None,
    };

    let result = sqlx::query(
        r#"
        UPDATE users
        SET username = ?1,
            email = ?2,
            password_hash = COALESCE(?3, password_hash)
        WHERE id = ?4
        "#,
    )
    .bind(username.trim())
    .bind(email.trim())
    .bind(new_hash)
    .bind(user_id)
    .execute(db_pool)
    .await;

    let rows_affected = match result {
        Ok(done) => done.rows_affected(),
        Err(e) if is_unique_violation(&e) => return Err(AppError::DuplicateEmail),
        Err(e) => return Err(e.into()),
    };

    if rows_affected == 0 {
        tracing::warn!("Profile update failed: user {} not found.", user_id);
        return Err(AppError::NotFound("User"));
    }
    tracing::info!("✅ Profile of user {} updated.", user_id);
    Ok(())
}

/// Changes the role of an account (admin action).
pub async fn set_user_role(db_pool: &SqlitePool, user_id: i64, role: Role) -> AppResult<()> {
    tracing::info!("Setting role of user {} to {}", user_id, role);
    let rows_affected = sqlx::query("UPDATE users SET role = ?1 WHERE id = ?2 AND is_synthetic = 0")
        .bind(role)
        .bind(user_id)
        .execute(db_pool)
        .await?
        .rows_affected();

    if rows_affected == 0 {
        tracing::warn!("Role change failed: user {} not found.", user_id);
        return Err(AppError::NotFound("User"));
    }
    Ok(())
}

/// Number of administrators, used to keep at least one around.
pub async fn count_admins(db_pool: &SqlitePool) -> AppResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = ?1")
        .bind(Role::Admin)
        .fetch_one(db_pool)
        .await?;
    Ok(count)
}
