// src/web/payment_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        payment::{parse_amount, PaymentForm},
        user::Role,
    },
    services::payment_service,
    state::AppState,
    templates::{render, Nav, PaymentsPage, StaffPaymentsPage},
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

// GET /payments
pub async fn show_payments(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    session: Session,
) -> AppResult<Response> {
    let payments = payment_service::list_for_student(&state.db_pool, current.id).await?;
    let page = PaymentsPage {
        nav: Some(Nav::from(&current)),
        flash: flash::take(&session).await?,
        payments,
        can_submit: current.role == Role::Student,
    };
    Ok(render(&page)?.into_response())
}

// POST /payments
pub async fn handle_submit_payment(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    session: Session,
    Form(form): Form<PaymentForm>,
) -> AppResult<Response> {
    let Some(amount_cents) = parse_amount(&form.amount) else {
        tracing::warn!("Rejected payment amount '{}' from user {}", form.amount, current.id);
        return Ok(flash::redirect(
            &session,
            FlashKind::Error,
            "Enter a positive amount, e.g. 120.50.",
            "/payments",
        )
        .await?
        .into_response());
    };

    let (kind, message) = match payment_service::submit_payment(&state.db_pool, current.id, amount_cents).await {
        Ok(_) => (
            FlashKind::Success,
            "Payment recorded. It will be confirmed by the staff.".to_string(),
        ),
        Err(e @ AppError::Forbidden) => {
            return Ok(flash::redirect(&session, FlashKind::Error, &e.to_string(), "/dashboard")
                .await?
                .into_response());
        }
        Err(e) if e.is_user_facing() => (FlashKind::Error, e.to_string()),
        Err(e) => return Err(e),
    };
    Ok(flash::redirect(&session, kind, &message, "/payments").await?.into_response())
}

// GET /staff/payments
pub async fn show_staff_payments(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    session: Session,
) -> AppResult<Response> {
    let payments = payment_service::list_all(&state.db_pool).await?;
    let page = StaffPaymentsPage {
        nav: Some(Nav::from(&current)),
        flash: flash::take(&session).await?,
        payments,
    };
    Ok(render(&page)?.into_response())
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    Approve,
    Reject,
}

// POST /staff/payments/{id}/{action}
pub async fn handle_review(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    session: Session,
    Path((payment_id, action)): Path<(i64, ReviewAction)>,
) -> AppResult<Response> {
    let approve = matches!(action, ReviewAction::Approve);
    let (kind, message) = match payment_service::review_payment(&state.db_pool, payment_id, approve, current.id).await {
        Ok(status) => (FlashKind::Success, format!("Payment #{} marked as {}.", payment_id, status)),
        Err(e) if e.is_user_facing() => (FlashKind::Error, e.to_string()),
        Err(e) => return Err(e),
    };
    Ok(flash::redirect(&session, kind, &message, "/staff/payments").await?.into_response())
}
