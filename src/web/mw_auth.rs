// src/web/mw_auth.rs
use crate::{
    error::{AppError, AppResult},
    models::user::Role,
    services::user_service,
    state::AppState,
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

/// Session key holding the logged-in user's id.
pub const SESSION_USER_KEY: &str = "user_id";

/// Logged-in user, placed in the request extensions by `require_auth`.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

/// Reads the user id stored in the session, if any.
pub async fn session_user_id(session: &Session) -> AppResult<Option<i64>> {
    session
        .get::<i64>(SESSION_USER_KEY)
        .await
        .map_err(|e| AppError::SessionError(format!("Failed to read session: {}", e)))
}

// Middleware: only lets logged-in users through
pub async fn require_auth(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(user_id) = session_user_id(&session).await? else {
        tracing::debug!("Auth MW: no user_id in session, redirecting to /login");
        return Ok(Redirect::to("/login").into_response());
    };

    // The account may have disappeared since login
    let Some(user) = user_service::find_user_by_id(&state.db_pool, user_id).await? else {
        tracing::warn!("Auth MW: session points to missing user {}, logging out.", user_id);
        session
            .flush()
            .await
            .map_err(|e| AppError::SessionError(format!("Failed to clear session: {}", e)))?;
        return Ok(Redirect::to("/login").into_response());
    };

    tracing::debug!("Auth MW: user {} ({}) authenticated.", user.id, user.role);
    request.extensions_mut().insert(CurrentUser {
        id: user.id,
        username: user.username,
        role: user.role,
    });

    Ok(next.run(request).await)
}
