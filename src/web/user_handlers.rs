// src/web/user_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{AccountForm, Role},
    services::{enrollment_service, payment_service, user_service},
    state::AppState,
    templates::{render, DashboardPage, Nav, ProfilePage},
    web::{
        flash::{self, FlashKind},
        mw_auth::CurrentUser,
        validation_messages,
    },
};
use axum::{
    extract::{Extension, Form, State},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use validator::Validate;

// GET /dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    session: Session,
) -> AppResult<Response> {
    tracing::debug!("GET /dashboard for user {}", current.id);

    // Students see their own enrollments and payments; staff see the queues
    let (enrollments, payments, pending_enrollments, pending_payments) = match current.role {
        Role::Student => (
            enrollment_service::list_for_student(&state.db_pool, current.id).await?,
            payment_service::list_for_student(&state.db_pool, current.id).await?,
            0,
            0,
        ),
        Role::Admin => (
            Vec::new(),
            Vec::new(),
            enrollment_service::count_pending(&state.db_pool).await?,
            count_pending_payments(&state).await?,
        ),
        Role::Teacher => (Vec::new(), Vec::new(), 0, count_pending_payments(&state).await?),
    };

    let page = DashboardPage {
        nav: Some(Nav::from(&current)),
        flash: flash::take(&session).await?,
        user_name: current.username.clone(),
        role_label: current.role.label(),
        is_student: current.role == Role::Student,
        is_admin: current.role == Role::Admin,
        is_staff: current.role.is_staff(),
        enrollments,
        payments,
        pending_enrollments,
        pending_payments,
    };
    Ok(render(&page)?.into_response())
}

async fn count_pending_payments(state: &AppState) -> AppResult<i64> {
    payment_service::count_pending(&state.db_pool).await
}

// GET /profile
pub async fn show_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    session: Session,
) -> AppResult<Response> {
    let user = user_service::find_user_by_id(&state.db_pool, current.id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    let page = ProfilePage {
        nav: Some(Nav::from(&current)),
        flash: flash::take(&session).await?,
        errors: Vec::new(),
        username: user.username,
        email: user.email,
    };
    Ok(render(&page)?.into_response())
}

// POST /profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    session: Session,
    Form(mut form): Form<AccountForm>,
) -> AppResult<Response> {
    form.username = form.username.trim().to_string();
    form.email = form.email.trim().to_string();
    tracing::info!("POST /profile for user {}", current.id);

    let errors = match form.validate() {
        Ok(()) => Vec::new(),
        Err(e) => validation_messages(&e),
    };
    if !errors.is_empty() {
        return Ok(render(&profile_with_errors(&current, errors, form))?.into_response());
    }

    // A blank password keeps the current one
    let new_password = Some(form.password.as_str()).filter(|p| !p.is_empty());

    match user_service::update_profile(&state.db_pool, current.id, &form.username, &form.email, new_password).await {
        Ok(()) => Ok(flash::redirect(
            &session,
            FlashKind::Success,
            "Your profile has been updated!",
            "/dashboard",
        )
        .await?
        .into_response()),
        Err(e) if e.is_user_facing() => {
            Ok(render(&profile_with_errors(&current, vec![e.to_string()], form))?.into_response())
        }
        Err(e) => Err(e),
    }
}

fn profile_with_errors(current: &CurrentUser, errors: Vec<String>, form: AccountForm) -> ProfilePage {
    ProfilePage {
        nav: Some(Nav::from(current)),
        flash: None,
        errors,
        username: form.username,
        email: form.email,
    }
}
