use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::RequireAuth;
use crate::authz::{Action, Target, authorize};
use crate::error::DenyReason;
use crate::server::AppState;
use crate::server::dto::{ReportBody, ReportListParams, ReportParams};
use crate::server::response::{ApiError, ApiResponse, Empty, ok_empty, require};
use crate::server::validation::validate_text;
use crate::types::{Report, ReportStatus};

pub fn reports_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/report", get(get_report).post(create_report))
        .route("/report/list", get(list_reports))
        .route("/report/close", post(close_report))
}

#[derive(Serialize)]
struct ReportData {
    report: Report,
}

#[derive(Serialize)]
struct ReportsData {
    reports: Vec<Report>,
}

async fn create_report(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(body): Json<ReportBody>,
) -> Result<Json<ApiResponse<ReportData>>, ApiError> {
    validate_text(&body.reason)?;
    authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::CreateReport,
        Target::Global,
    )?;

    let report = Report {
        report_id: Uuid::new_v4().to_string(),
        item_type: body.item_type,
        item_id: body.item_id,
        reporter: principal.username,
        reason: body.reason,
        status: ReportStatus::Open,
        created_at: Utc::now(),
    };
    state.store.create_report(&report)?;
    Ok(ApiResponse::ok(ReportData { report }))
}

async fn get_report(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReportParams>,
) -> Result<Json<ApiResponse<ReportData>>, ApiError> {
    authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::ViewReports,
        Target::Global,
    )?;
    let id = require(params.id, "id")?;
    let report = state
        .store
        .get_report(&id)?
        .ok_or(crate::error::Error::Denied(DenyReason::ReportDoesntExist))?;
    Ok(ApiResponse::ok(ReportData { report }))
}

async fn list_reports(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReportListParams>,
) -> Result<Json<ApiResponse<ReportsData>>, ApiError> {
    authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::ViewReports,
        Target::Global,
    )?;
    let reports = state.store.list_reports(params.open_only)?;
    Ok(ApiResponse::ok(ReportsData { reports }))
}

async fn close_report(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReportParams>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    authorize(
        state.store.as_ref(),
        Some(&principal),
        Action::CloseReport,
        Target::Global,
    )?;
    let id = require(params.id, "id")?;
    if !state.store.close_report(&id)? {
        return Err(crate::error::Error::Denied(DenyReason::ReportDoesntExist).into());
    }
    Ok(ok_empty())
}
