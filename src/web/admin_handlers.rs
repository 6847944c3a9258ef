// src/web/admin_handlers.rs
use crate::{
    error::AppResult,
    models::user::Role,
    services::user_service,
    state::AppState,
    templates::{render, AdminUsersPage, Nav, UserRow},
    web::{
        flash::{self, FlashKind},
        mw_auth::CurrentUser,
    },
};
use axum::{
    extract::{Extension, Form, Path, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

#[derive(Deserialize, Debug)]
pub struct RoleForm {
    role: String,
}

/// GET /admin/users - account list with a role selector per row
pub async fn show_users(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    session: Session,
) -> AppResult<Response> {
    tracing::debug!("GET /admin/users");
    let users = user_service::find_all_users(&state.db_pool)
        .await?
        .into_iter()
        .map(UserRow::from)
        .collect();

    let page = AdminUsersPage {
        nav: Some(Nav::from(&current)),
        flash: flash::take(&session).await?,
        users,
        all_roles: &Role::ALL,
    };
    Ok(render(&page)?.into_response())
}

/// POST /admin/users/{id}/role
pub async fn handle_set_role(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    session: Session,
    Path(user_id): Path<i64>,
    Form(form): Form<RoleForm>,
) -> AppResult<Response> {
    let role: Role = match form.role.parse() {
        Ok(role) => role,
        Err(e) => {
            tracing::warn!("Role change refused: {}", e);
            return back(&session, FlashKind::Error, "Unknown role.").await;
        }
    };

    // The portal must keep an administrator
    if user_id == current.id && role != Role::Admin {
        return back(&session, FlashKind::Error, "You cannot remove your own administrator role.").await;
    }
    if role != Role::Admin {
        if let Some(target) = user_service::find_user_by_id(&state.db_pool, user_id).await? {
            if target.role == Role::Admin && user_service::count_admins(&state.db_pool).await? <= 1 {
                return back(&session, FlashKind::Error, "At least one administrator is required.").await;
            }
        }
    }

    match user_service::set_user_role(&state.db_pool, user_id, role).await {
        Ok(()) => {
            tracing::info!("✅ User {} is now {} (changed by {}).", user_id, role, current.id);
            back(&session, FlashKind::Success, &format!("Role updated to {}.", role.label())).await
        }
        Err(e) if e.is_user_facing() => back(&session, FlashKind::Error, &e.to_string()).await,
        Err(e) => Err(e),
    }
}

async fn back(session: &Session, kind: FlashKind, message: &str) -> AppResult<Response> {
    Ok(flash::redirect(session, kind, message, "/admin/users").await?.into_response())
}
