// src/web/enrollment_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::enrollment::{EnrollmentOutcome, EnrollmentStatus, ValidationAction},
    services::enrollment_service,
    state::AppState,
    templates::{render, AdminEnrollmentsPage, Nav},
    web::{
        flash::{self, FlashKind},
        mw_auth::CurrentUser,
    },
};
use axum::{
    extract::{Extension, Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

// POST /courses/{id}/enroll
pub async fn handle_enroll(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    session: Session,
    Path(course_id): Path<i64>,
) -> AppResult<Response> {
    let (kind, message) =
        match enrollment_service::request_enrollment(&state.db_pool, &state.policy, current.id, course_id).await {
            Ok(EnrollmentOutcome::Pending) => (
                FlashKind::Success,
                "Enrollment requested. An administrator will review it shortly.".to_string(),
            ),
            Ok(EnrollmentOutcome::Waitlisted) => (
                FlashKind::Info,
                "The course is full. You have been added to the waitlist.".to_string(),
            ),
            Ok(EnrollmentOutcome::AlreadyWaitlisted) => (
                FlashKind::Info,
                "You are already on the waitlist for this course.".to_string(),
            ),
            // The catalog offers nothing to non-students
            Err(e @ AppError::Forbidden) => {
                return Ok(flash::redirect(&session, FlashKind::Error, &e.to_string(), "/dashboard")
                    .await?
                    .into_response());
            }
            Err(e) if e.is_user_facing() => (FlashKind::Error, e.to_string()),
            Err(e) => return Err(e),
        };
    Ok(flash::redirect(&session, kind, &message, "/courses").await?.into_response())
}

// POST /enrollments/{id}/withdraw
pub async fn handle_withdraw(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    session: Session,
    Path(enrollment_id): Path<i64>,
) -> AppResult<Response> {
    let (kind, message) =
        match enrollment_service::withdraw_enrollment(&state.db_pool, &state.policy, current.id, enrollment_id).await {
            Ok(course_id) => {
                tracing::info!("Student {} left course {}.", current.id, course_id);
                (FlashKind::Success, "Your enrollment has been withdrawn.".to_string())
            }
            Err(e) if e.is_user_facing() => (FlashKind::Error, e.to_string()),
            Err(e) => return Err(e),
        };
    Ok(flash::redirect(&session, kind, &message, "/dashboard").await?.into_response())
}

#[derive(Deserialize, Debug, Default)]
pub struct EnrollmentFilter {
    #[serde(default)]
    status: Option<String>,
}

impl EnrollmentFilter {
    // Unknown or empty values mean "no filter"
    fn status(&self) -> Option<EnrollmentStatus> {
        match self.status.as_deref() {
            Some("pending") => Some(EnrollmentStatus::Pending),
            Some("approved") => Some(EnrollmentStatus::Approved),
            Some("rejected") => Some(EnrollmentStatus::Rejected),
            Some("waitlist") => Some(EnrollmentStatus::Waitlist),
            _ => None,
        }
    }
}

// GET /admin/enrollments?status=pending
pub async fn show_enrollments(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    session: Session,
    Query(filter): Query<EnrollmentFilter>,
) -> AppResult<Response> {
    let status = filter.status();
    let enrollments = enrollment_service::list_all(&state.db_pool, status).await?;

    let page = AdminEnrollmentsPage {
        nav: Some(Nav::from(&current)),
        flash: flash::take(&session).await?,
        enrollments,
        filter: status.map(|s| s.as_str().to_string()).unwrap_or_default(),
    };
    Ok(render(&page)?.into_response())
}

// POST /admin/enrollments/{id}/{action}
pub async fn handle_validate(
    State(state): State<AppState>,
    session: Session,
    Path((enrollment_id, action)): Path<(i64, ValidationAction)>,
) -> AppResult<Response> {
    let (kind, message) =
        match enrollment_service::validate_enrollment(&state.db_pool, &state.policy, enrollment_id, action).await {
            Ok(enrollment) => (
                FlashKind::Success,
                format!("Enrollment #{} is now {}.", enrollment.id, enrollment.status),
            ),
            Err(e) if e.is_user_facing() => (FlashKind::Error, e.to_string()),
            Err(e) => return Err(e),
        };
    Ok(flash::redirect(&session, kind, &message, "/admin/enrollments").await?.into_response())
}
