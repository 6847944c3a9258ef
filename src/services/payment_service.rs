// src/services/payment_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{payment::PaymentStatus, payment::PaymentView, user::Role},
};
use sqlx::SqlitePool;

const VIEW_SELECT: &str = r#"
    SELECT p.id, p.student_id, s.username AS student_name, p.amount_cents, p.status,
           p.created_at, p.reviewed_at, r.username AS reviewer_name
    FROM payments p
    JOIN users s ON s.id = p.student_id
    LEFT JOIN users r ON r.id = p.reviewed_by
"#;

/// Records an amount a student claims to have paid, awaiting review.
pub async fn submit_payment(db_pool: &SqlitePool, student_id: i64, amount_cents: i64) -> AppResult<i64> {
    if amount_cents <= 0 {
        return Err(AppError::Validation("The amount must be greater than zero.".into()));
    }

    let role: Option<Role> = sqlx::query_scalar("SELECT role FROM users WHERE id = ?1")
        .bind(student_id)
        .fetch_optional(db_pool)
        .await?;
    match role {
        Some(Role::Student) => {}
        Some(Role::Teacher) | Some(Role::Admin) => return Err(AppError::Forbidden),
        None => return Err(AppError::NotFound("Student")),
    }

    let id = sqlx::query("INSERT INTO payments (student_id, amount_cents, status) VALUES (?1, ?2, ?3)")
        .bind(student_id)
        .bind(amount_cents)
        .bind(PaymentStatus::Pending)
        .execute(db_pool)
        .await?
        .last_insert_rowid();

    tracing::info!("💰 Payment {} of {} cents recorded for student {}.", id, amount_cents, student_id);
    Ok(id)
}

/// Staff decision on a pending payment. A reviewed payment stays as it is.
pub async fn review_payment(
    db_pool: &SqlitePool,
    payment_id: i64,
    approve: bool,
    reviewer_id: i64,
) -> AppResult<PaymentStatus> {
    let status = if approve {
        PaymentStatus::Approved
    } else {
        PaymentStatus::Rejected
    };
    tracing::info!("Reviewing payment {} -> {} (by {})", payment_id, status, reviewer_id);

    let rows_affected = sqlx::query(
        r#"
        UPDATE payments
        SET status = ?1, reviewed_at = CURRENT_TIMESTAMP, reviewed_by = ?2
        WHERE id = ?3 AND status = 'pending'
        "#,
    )
    .bind(status)
    .bind(reviewer_id)
    .bind(payment_id)
    .execute(db_pool)
    .await?
    .rows_affected();

    if rows_affected == 0 {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM payments WHERE id = ?1)")
            .bind(payment_id)
            .fetch_one(db_pool)
            .await?;
        return Err(if exists {
            AppError::PaymentAlreadyReviewed
        } else {
            AppError::NotFound("Payment")
        });
    }

    Ok(status)
}

pub async fn list_for_student(db_pool: &SqlitePool, student_id: i64) -> AppResult<Vec<PaymentView>> {
    let rows = sqlx::query_as::<_, PaymentView>(&format!(
        "{} WHERE p.student_id = ?1 ORDER BY p.id DESC",
        VIEW_SELECT
    ))
    .bind(student_id)
    .fetch_all(db_pool)
    .await?;
    Ok(rows)
}

/// All payments, pending first.
pub async fn list_all(db_pool: &SqlitePool) -> AppResult<Vec<PaymentView>> {
    let rows = sqlx::query_as::<_, PaymentView>(&format!(
        "{} ORDER BY (p.status = 'pending') DESC, p.id DESC",
        VIEW_SELECT
    ))
    .fetch_all(db_pool)
    .await?;
    Ok(rows)
}

/// Payments waiting for a staff decision.
pub async fn count_pending(db_pool: &SqlitePool) -> AppResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE status = 'pending'")
        .fetch_one(db_pool)
        .await?;
    Ok(count)
}
