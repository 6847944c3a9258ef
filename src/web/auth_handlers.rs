// src/web/auth_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{AccountForm, LoginForm, Role},
    services::user_service,
    state::AppState,
    templates::{render, IndexPage, LoginPage, Nav, RegisterPage},
    web::{
        flash::{self, FlashKind},
        mw_auth::{session_user_id, SESSION_USER_KEY},
        validation_messages,
    },
};
use axum::{
    extract::{Form, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use validator::Validate;

// GET /
pub async fn index(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Response> {
    let nav = match session_user_id(&session).await? {
        Some(id) => user_service::find_user_by_id(&state.db_pool, id)
            .await?
            .map(|u| Nav { username: u.username, role: u.role }),
        None => None,
    };
    let page = IndexPage {
        nav,
        flash: flash::take(&session).await?,
    };
    Ok(render(&page)?.into_response())
}

// GET /login
pub async fn show_login_form(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Response> {
    if session_user_id(&session).await?.is_some() {
        tracing::debug!("GET /login: already logged in, redirecting to /dashboard");
        return Ok(Redirect::to("/dashboard").into_response());
    }

    let page = LoginPage {
        nav: None,
        flash: flash::take(&session).await?,
        error: None,
        email: String::new(),
    };
    Ok(render(&page)?.into_response())
}

// POST /login
pub async fn handle_login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    tracing::info!("Login attempt for {}", form.email);

    match user_service::authenticate(&state.db_pool, &form.email, &form.password).await {
        Ok(user) => {
            // New session id on privilege change
            session
                .cycle_id()
                .await
                .map_err(|e| AppError::SessionError(format!("Failed to cycle id: {}", e)))?;
            session
                .insert(SESSION_USER_KEY, user.id)
                .await
                .map_err(|e| AppError::SessionError(format!("Failed to write session: {}", e)))?;

            tracing::info!("✅ User {} logged in.", user.id);
            Ok(Redirect::to("/dashboard").into_response())
        }
        Err(AppError::InvalidCredentials) => {
            let page = LoginPage {
                nav: None,
                flash: None,
                error: Some(AppError::InvalidCredentials.to_string()),
                email: form.email,
            };
            Ok(render(&page)?.into_response())
        }
        Err(e) => Err(e),
    }
}

// GET /logout
pub async fn handle_logout(session: Session) -> AppResult<Redirect> {
    let user_id = session_user_id(&session).await.ok().flatten();

    session
        .delete()
        .await
        .map_err(|e| AppError::SessionError(format!("Failed to delete session: {}", e)))?;

    match user_id {
        Some(id) => tracing::info!("🚪 User {} logged out.", id),
        None => tracing::info!("🚪 Anonymous session closed."),
    }
    Ok(Redirect::to("/"))
}

fn register_page(role: Role, errors: Vec<String>, form: Option<&AccountForm>) -> RegisterPage {
    let action = match role {
        Role::Teacher => "/register/teacher",
        Role::Student | Role::Admin => "/register/student",
    };
    RegisterPage {
        nav: None,
        flash: None,
        role_label: role.label(),
        action,
        errors,
        username: form.map(|f| f.username.clone()).unwrap_or_default(),
        email: form.map(|f| f.email.clone()).unwrap_or_default(),
    }
}

// GET /register/student
pub async fn show_register_student(session: Session) -> AppResult<Response> {
    show_register(&session, Role::Student).await
}

// GET /register/teacher
pub async fn show_register_teacher(session: Session) -> AppResult<Response> {
    show_register(&session, Role::Teacher).await
}

async fn show_register(session: &Session, role: Role) -> AppResult<Response> {
    if session_user_id(session).await?.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }
    Ok(render(&register_page(role, Vec::new(), None))?.into_response())
}

// POST /register/student
pub async fn handle_register_student(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AccountForm>,
) -> AppResult<Response> {
    register(&state, &session, Role::Student, form).await
}

// POST /register/teacher
pub async fn handle_register_teacher(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AccountForm>,
) -> AppResult<Response> {
    register(&state, &session, Role::Teacher, form).await
}

async fn register(state: &AppState, session: &Session, role: Role, mut form: AccountForm) -> AppResult<Response> {
    form.username = form.username.trim().to_string();
    form.email = form.email.trim().to_string();
    tracing::info!("Registration attempt ({}) for {}", role, form.email);

    let mut errors = match form.validate() {
        Ok(()) => Vec::new(),
        Err(e) => validation_messages(&e),
    };
    if form.password.is_empty() {
        errors.push("Password is required.".to_string());
    }
    if !errors.is_empty() {
        tracing::warn!("Registration refused: invalid form.");
        return Ok(render(&register_page(role, errors, Some(&form)))?.into_response());
    }

    match user_service::create_user(&state.db_pool, &form.username, &form.email, &form.password, role).await {
        Ok(_) => {
            let message = format!("Congratulations, you are now a registered {}!", role);
            Ok(flash::redirect(session, FlashKind::Success, &message, "/login").await?.into_response())
        }
        Err(e) if e.is_user_facing() => {
            Ok(render(&register_page(role, vec![e.to_string()], Some(&form)))?.into_response())
        }
        Err(e) => Err(e),
    }
}
