// src/error.rs
use axum::{http::StatusCode, response::Html, response::IntoResponse};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    SqlxMigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Environment variable error: {0}")]
    EnvVarError(#[from] std::env::VarError),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Failed to process password")]
    PasswordHashingError,

    #[error("Invalid email or password.")]
    InvalidCredentials,

    #[error("Session error: {0}")]
    SessionError(String),

    #[error("Template rendering failed: {0}")]
    TemplateError(#[from] askama::Error),

    // --- Domain errors (shown to the user as flash messages) ---
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found.")]
    NotFound(&'static str),

    #[error("An account with this email already exists.")]
    DuplicateEmail,

    #[error("You already have an enrollment for this course.")]
    DuplicateEnrollment,

    #[error("This course has no seats left.")]
    CourseFull,

    #[error("You have reached the limit of {0} active enrollments.")]
    EnrollmentLimitReached(i64),

    #[error("This payment has already been reviewed.")]
    PaymentAlreadyReviewed,

    #[error("This action is not allowed for your account.")]
    Forbidden,

    #[error("Unexpected internal error")]
    InternalServerError,

    #[error("Not authorized")]
    Unauthorized,
}

impl AppError {
    /// Domain failures that handlers report back through a flash message
    /// instead of an error page.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::NotFound(_)
                | AppError::DuplicateEmail
                | AppError::DuplicateEnrollment
                | AppError::CourseFull
                | AppError::EnrollmentLimitReached(_)
                | AppError::PaymentAlreadyReviewed
                | AppError::InvalidCredentials
                | AppError::Forbidden
        )
    }
}

/// True when the database refused a write because of a UNIQUE constraint.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

// Turns an AppError into an HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, user_message) = match &self {
            AppError::SqlxError(_) | AppError::SqlxMigrateError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to access data.".to_string())
            }
            AppError::EnvVarError(_) | AppError::ConfigError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Configuration error.".to_string())
            }
            AppError::PasswordHashingError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to process credentials.".to_string())
            }
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::SessionError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to manage your session.".to_string())
            }
            AppError::Unauthorized | AppError::Forbidden => {
                (StatusCode::FORBIDDEN, "You do not have permission to view this page.".to_string())
            }
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Validation(_)
            | AppError::DuplicateEmail
            | AppError::DuplicateEnrollment
            | AppError::CourseFull
            | AppError::EnrollmentLimitReached(_)
            | AppError::PaymentAlreadyReviewed => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::TemplateError(_) | AppError::InternalServerError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "An unexpected error occurred.".to_string())
            }
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {:?}", self);
        } else {
            tracing::warn!("Request refused: {}", self);
        }

        (status, Html(format!(r#"
            <!DOCTYPE html><html><head><title>Error</title><style>body{{font-family:sans-serif;}}</style></head>
            <body><h1>Error {status_code}</h1><p>{message}</p><a href="/dashboard">Back to dashboard</a></body></html>
         "#, status_code = status.as_u16(), message = user_message))).into_response()
    }
}

// Default Result type for the application
pub type AppResult<T = ()> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::utils::TestDbBuilder;

    #[tokio::test]
    async fn only_unique_constraints_count_as_unique_violations() {
        let db = TestDbBuilder::new()
            .student("ana")
            .course("Rust")
            .enrollment("ana", "Rust", "pending")
            .build()
            .await
            .expect("test db");

        let duplicate = sqlx::query("INSERT INTO enrollments (student_id, course_id, status) VALUES (?1, ?2, 'pending')")
            .bind(db.user_id("ana"))
            .bind(db.course_id("Rust"))
            .execute(&db.pool)
            .await
            .expect_err("duplicate pair");
        assert!(is_unique_violation(&duplicate));

        let bad_amount = sqlx::query("INSERT INTO payments (student_id, amount_cents) VALUES (?1, 0)")
            .bind(db.user_id("ana"))
            .execute(&db.pool)
            .await
            .expect_err("check constraint");
        assert!(!is_unique_violation(&bad_amount));
    }
}
