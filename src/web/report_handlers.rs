// src/web/report_handlers.rs
use crate::{
    error::AppResult,
    services::report_service::{self, Report},
    state::AppState,
    templates::{render, Nav, ReportPage},
    web::{flash, mw_auth::CurrentUser},
};
use axum::{
    extract::{Extension, State},
    response::{IntoResponse, Response},
    Json,
};
use tower_sessions::Session;

// GET /reports
pub async fn show_report(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    session: Session,
) -> AppResult<Response> {
    let report = report_service::build_report(&state.db_pool, &state.policy).await?;
    let page = ReportPage {
        nav: Some(Nav::from(&current)),
        flash: flash::take(&session).await?,
        report,
    };
    Ok(render(&page)?.into_response())
}

// GET /reports.json
pub async fn report_json(State(state): State<AppState>) -> AppResult<Json<Report>> {
    let report = report_service::build_report(&state.db_pool, &state.policy).await?;
    Ok(Json(report))
}
