// src/web/course_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{course::CourseForm, user::Role},
    services::{course_service, enrollment_service},
    state::AppState,
    templates::{render, CourseFormPage, CoursesPage, Nav},
    web::{
        flash::{self, FlashKind},
        mw_auth::CurrentUser,
        validation_messages,
    },
};
use axum::{
    extract::{Extension, Form, Path, State},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use validator::Validate;

// GET /courses
pub async fn list_courses(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    session: Session,
) -> AppResult<Response> {
    let student_id = (current.role == Role::Student).then_some(current.id);
    let courses = enrollment_service::catalog(&state.db_pool, &state.policy, student_id).await?;

    let page = CoursesPage {
        nav: Some(Nav::from(&current)),
        flash: flash::take(&session).await?,
        courses,
        is_student: current.role == Role::Student,
        is_admin: current.role == Role::Admin,
    };
    Ok(render(&page)?.into_response())
}

// GET /admin/courses/new
pub async fn show_create_form(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    session: Session,
) -> AppResult<Response> {
    let page = CourseFormPage {
        nav: Some(Nav::from(&current)),
        flash: flash::take(&session).await?,
        title: "Create course".to_string(),
        action: "/admin/courses/new".to_string(),
        errors: Vec::new(),
        name: String::new(),
        description: String::new(),
        roster: Vec::new(),
        is_edit: false,
    };
    Ok(render(&page)?.into_response())
}

// POST /admin/courses/new
pub async fn handle_create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    session: Session,
    Form(form): Form<CourseForm>,
) -> AppResult<Response> {
    let form = trimmed(form);
    tracing::info!("POST /admin/courses/new: '{}' by {}", form.name, current.id);

    if let Err(e) = form.validate() {
        let page = CourseFormPage {
            nav: Some(Nav::from(&current)),
            flash: None,
            title: "Create course".to_string(),
            action: "/admin/courses/new".to_string(),
            errors: validation_messages(&e),
            name: form.name,
            description: form.description,
            roster: Vec::new(),
            is_edit: false,
        };
        return Ok(render(&page)?.into_response());
    }

    course_service::create_course(&state.db_pool, &form.name, &form.description).await?;
    Ok(flash::redirect(
        &session,
        FlashKind::Success,
        "Course created successfully",
        "/courses",
    )
    .await?
    .into_response())
}

// GET /admin/courses/{id}/edit
pub async fn show_edit_form(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    session: Session,
    Path(course_id): Path<i64>,
) -> AppResult<Response> {
    let Some(course) = course_service::find_course_by_id(&state.db_pool, course_id).await? else {
        tracing::warn!("Edit requested for missing course {}", course_id);
        return not_found(&session).await;
    };
    let roster = enrollment_service::list_for_course(&state.db_pool, course_id).await?;

    let page = CourseFormPage {
        nav: Some(Nav::from(&current)),
        flash: flash::take(&session).await?,
        title: format!("Edit course: {}", course.name),
        action: format!("/admin/courses/{}/edit", course_id),
        errors: Vec::new(),
        name: course.name,
        description: course.description,
        roster,
        is_edit: true,
    };
    Ok(render(&page)?.into_response())
}

// POST /admin/courses/{id}/edit
pub async fn handle_edit(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    session: Session,
    Path(course_id): Path<i64>,
    Form(form): Form<CourseForm>,
) -> AppResult<Response> {
    let form = trimmed(form);
    tracing::info!("POST /admin/courses/{}/edit by {}", course_id, current.id);

    if let Err(e) = form.validate() {
        let roster = enrollment_service::list_for_course(&state.db_pool, course_id).await?;
        let page = CourseFormPage {
            nav: Some(Nav::from(&current)),
            flash: None,
            title: "Edit course".to_string(),
            action: format!("/admin/courses/{}/edit", course_id),
            errors: validation_messages(&e),
            name: form.name,
            description: form.description,
            roster,
            is_edit: true,
        };
        return Ok(render(&page)?.into_response());
    }

    match course_service::update_course(&state.db_pool, course_id, &form.name, &form.description).await {
        Ok(()) => Ok(flash::redirect(
            &session,
            FlashKind::Success,
            "Course updated.",
            "/courses",
        )
        .await?
        .into_response()),
        Err(AppError::NotFound(_)) => not_found(&session).await,
        Err(e) => Err(e),
    }
}

// POST /admin/courses/{id}/delete
pub async fn handle_delete(
    State(state): State<AppState>,
    session: Session,
    Path(course_id): Path<i64>,
) -> AppResult<Response> {
    match course_service::delete_course(&state.db_pool, course_id).await {
        Ok(()) => Ok(flash::redirect(
            &session,
            FlashKind::Success,
            "Course deleted.",
            "/courses",
        )
        .await?
        .into_response()),
        Err(AppError::NotFound(_)) => not_found(&session).await,
        Err(e) => Err(e),
    }
}

// POST /admin/courses/{id}/duplicate
pub async fn handle_duplicate(
    State(state): State<AppState>,
    session: Session,
    Path(course_id): Path<i64>,
) -> AppResult<Response> {
    match enrollment_service::duplicate_course(&state.db_pool, course_id).await {
        Ok(clone) => {
            let message = format!(
                "Course duplicated; {} waitlisted student(s) moved to the new course.",
                clone.migrated
            );
            let target = format!("/admin/courses/{}/edit", clone.course_id);
            Ok(flash::redirect(&session, FlashKind::Success, &message, &target).await?.into_response())
        }
        Err(AppError::NotFound(_)) => not_found(&session).await,
        Err(e) => Err(e),
    }
}

// POST /admin/courses/{id}/mass-enroll
pub async fn handle_mass_enroll(
    State(state): State<AppState>,
    session: Session,
    Path(course_id): Path<i64>,
) -> AppResult<Response> {
    match enrollment_service::apply_mass_enrollment(&state.db_pool, &state.policy, course_id).await {
        Ok(0) => Ok(flash::redirect(
            &session,
            FlashKind::Info,
            "The course is already full.",
            "/courses",
        )
        .await?
        .into_response()),
        Ok(created) => {
            let message = format!("Mass enrollment applied: {} generated student(s) enrolled.", created);
            Ok(flash::redirect(&session, FlashKind::Success, &message, "/courses").await?.into_response())
        }
        Err(AppError::NotFound(_)) => not_found(&session).await,
        Err(e) => Err(e),
    }
}

fn trimmed(form: CourseForm) -> CourseForm {
    CourseForm {
        name: form.name.trim().to_string(),
        description: form.description.trim().to_string(),
    }
}

async fn not_found(session: &Session) -> AppResult<Response> {
    Ok(flash::redirect(session, FlashKind::Error, "Course not found.", "/courses")
        .await?
        .into_response())
}
