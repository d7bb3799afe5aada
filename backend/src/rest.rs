use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use shared::{FilterRequest, RosterResponse, SessionInfo, SignInRequest, SignInResponse};
use tracing::info;

use crate::domain::export;
use crate::domain::periods::HourFilter;
use crate::domain::session::{today_key, SessionService};
use crate::error::AppError;
use crate::store::AttendanceStore;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SessionService>,
    pub store: Arc<AttendanceStore>,
}

/// POST /api/signin
pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> Result<impl IntoResponse + std::fmt::Debug, AppError> {
    info!("POST /api/signin - name: {:?}", request.name);

    let record = state.session.sign_in(&request.name).await?;
    Ok((StatusCode::CREATED, Json(SignInResponse { record })))
}

/// GET /api/roster
pub async fn get_roster(State(state): State<AppState>) -> Json<RosterResponse> {
    let roster = state.session.roster().await;
    let filter = state.session.current_filter().await;

    Json(RosterResponse {
        entries: roster.entries,
        header_count: roster.header_count,
        rows_needed: roster.rows_needed,
        filter: filter.to_string(),
    })
}

/// GET /api/filter
pub async fn get_filter(State(state): State<AppState>) -> Json<FilterRequest> {
    Json(FilterRequest {
        filter: state.session.current_filter().await.to_string(),
    })
}

/// PUT /api/filter
pub async fn set_filter(
    State(state): State<AppState>,
    Json(request): Json<FilterRequest>,
) -> Result<StatusCode, AppError> {
    info!("PUT /api/filter - {}", request.filter);

    let filter: HourFilter = request.filter.parse().map_err(AppError::InvalidFilter)?;
    state.session.set_filter(filter).await;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/attendance/:id
pub async fn delete_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    info!("DELETE /api/attendance/{}", id);

    state.session.delete_one(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/attendance
pub async fn clear_attendance(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    let deleted = state.session.clear_all().await?;
    info!("cleared {} record(s) for today", deleted);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/export - the full history as a CSV download.
pub async fn export_attendance(
    State(state): State<AppState>,
) -> Result<impl IntoResponse + std::fmt::Debug, AppError> {
    let records = state.store.query_all().await.map_err(AppError::Store)?;
    if records.is_empty() {
        return Err(AppError::NothingToExport);
    }

    let csv = export::export_csv(&records).map_err(AppError::Store)?;
    let filename = export::export_filename(&today_key());
    info!("exporting {} record(s) as {}", records.len(), filename);

    let headers = [
        (header::CONTENT_TYPE, "text/csv".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];
    Ok((headers, csv))
}

/// GET /api/session
pub async fn get_session(State(state): State<AppState>) -> Json<SessionInfo> {
    Json(state.session.session_info())
}
