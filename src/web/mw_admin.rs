// src/web/mw_admin.rs
//
// Role gates. Both must run after `require_auth`, which provides CurrentUser.
use crate::{
    models::user::Role,
    web::{
        flash::{self, FlashKind},
        mw_auth::CurrentUser,
    },
};
use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

const DENIED_MESSAGE: &str = "You do not have permission to access that page.";

/// Lets only administrators through.
pub async fn require_admin(
    Extension(current): Extension<CurrentUser>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    match current.role {
        Role::Admin => next.run(request).await,
        Role::Teacher | Role::Student => {
            tracing::warn!("Admin MW: access denied for user {} ({}).", current.id, current.role);
            deny(&session).await
        }
    }
}

/// Lets teachers and administrators through.
pub async fn require_staff(
    Extension(current): Extension<CurrentUser>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    if current.role.is_staff() {
        next.run(request).await
    } else {
        tracing::warn!("Staff MW: access denied for user {} ({}).", current.id, current.role);
        deny(&session).await
    }
}

// Flash a notice and send the user back to their dashboard
async fn deny(session: &Session) -> Response {
    match flash::redirect(session, FlashKind::Error, DENIED_MESSAGE, "/dashboard").await {
        Ok(redirect) => redirect.into_response(),
        Err(e) => e.into_response(),
    }
}
