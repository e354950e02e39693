use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::config;
use crate::database::models::Professional;
use crate::error::ApiError;
use crate::services::professionals::{self, ProfessionalData};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /professionals/ - list the registry
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Professional>>, ApiError> {
    let api_config = &config::config().api;
    let skip = query.skip.unwrap_or(0).max(0);
    let limit = query
        .limit
        .unwrap_or(api_config.default_page_size)
        .clamp(0, api_config.max_page_size);

    let professionals = professionals::list(&state.pool, skip, limit).await?;
    Ok(Json(professionals))
}

/// GET /professionals/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Professional>, ApiError> {
    let professional = professionals::get(&state.pool, id).await?;
    Ok(Json(professional))
}

/// POST /professionals/ - register a professional
pub async fn create(
    State(state): State<AppState>,
    Json(data): Json<ProfessionalData>,
) -> Result<(StatusCode, Json<Professional>), ApiError> {
    let professional = professionals::create(&state.pool, &data).await?;
    Ok((StatusCode::CREATED, Json(professional)))
}

/// PUT /professionals/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(data): Json<ProfessionalData>,
) -> Result<Json<Professional>, ApiError> {
    let professional = professionals::update(&state.pool, id, &data).await?;
    Ok(Json(professional))
}

/// DELETE /professionals/:id - 204; association rows cascade, surgeries stay
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    professionals::delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
