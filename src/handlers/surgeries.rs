use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config;
use crate::error::ApiError;
use crate::services::surgeries::{self, SurgeryData, SurgeryFilter, SurgeryWithTeam};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub date: Option<NaiveDate>,
    pub physician_name: Option<String>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /surgeries/ - list, filterable by date and physician-name substring
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<SurgeryWithTeam>>, ApiError> {
    let api_config = &config::config().api;
    let filter = SurgeryFilter {
        date: query.date,
        physician_name: query.physician_name,
        skip: query.skip.unwrap_or(0).max(0),
        limit: query
            .limit
            .unwrap_or(api_config.default_page_size)
            .clamp(0, api_config.max_page_size),
    };

    let surgeries = surgeries::list(&state.pool, &filter).await?;
    Ok(Json(surgeries))
}

/// GET /surgeries/:code - fetch one with its team
pub async fn get(
    State(state): State<AppState>,
    Path(code): Path<i64>,
) -> Result<Json<SurgeryWithTeam>, ApiError> {
    let surgery = surgeries::get(&state.pool, code).await?;
    Ok(Json(surgery))
}

/// POST /surgeries/ - create with inline team spec
pub async fn create(
    State(state): State<AppState>,
    Json(data): Json<SurgeryData>,
) -> Result<(StatusCode, Json<SurgeryWithTeam>), ApiError> {
    let surgery = surgeries::create(&state.pool, &data).await?;
    Ok((StatusCode::CREATED, Json(surgery)))
}

/// PUT /surgeries/:code - full update plus team replacement. The path code
/// is authoritative; the body's surgery_code is accepted for wire
/// compatibility but ignored.
pub async fn update(
    State(state): State<AppState>,
    Path(code): Path<i64>,
    Json(data): Json<SurgeryData>,
) -> Result<Json<SurgeryWithTeam>, ApiError> {
    let surgery = surgeries::update(&state.pool, code, &data).await?;
    Ok(Json(surgery))
}

/// DELETE /surgeries/:code - delete surgery and cascade its associations
pub async fn delete(
    State(state): State<AppState>,
    Path(code): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    surgeries::delete(&state.pool, code).await?;
    Ok(Json(json!({
        "detail": format!("Surgery {} and its team associations were deleted", code)
    })))
}
