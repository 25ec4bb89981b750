// handlers/public/calculations.rs - Legacy unscoped collection
//
// Mounted only when `api.enable_public_calculations` is set. Every record is
// visible here regardless of owner; new records are created without one.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    extract::{Path, State},
    Json,
};

use crate::api::AppState;
use crate::calculation::CalculationView;
use crate::handlers::calculations::{self, CalculationCreate, CalculationUpdate};
use crate::middleware::ApiResult;
use crate::types::CalculationId;

/// POST /calculations
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CalculationCreate>, JsonRejection>,
) -> ApiResult<CalculationView> {
    let Json(body) = payload?;
    calculations::create(&state, None, body).await
}

/// GET /calculations
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<CalculationView>> {
    calculations::list(&state, None).await
}

/// GET /calculations/:id
pub async fn get(
    State(state): State<AppState>,
    path: Result<Path<CalculationId>, PathRejection>,
) -> ApiResult<CalculationView> {
    let Path(id) = path?;
    calculations::get(&state, None, id).await
}

/// PUT|PATCH /calculations/:id
pub async fn update(
    State(state): State<AppState>,
    path: Result<Path<CalculationId>, PathRejection>,
    payload: Result<Json<CalculationUpdate>, JsonRejection>,
) -> ApiResult<CalculationView> {
    let Path(id) = path?;
    let Json(body) = payload?;
    calculations::update(&state, None, id, body).await
}

/// DELETE /calculations/:id
pub async fn delete(
    State(state): State<AppState>,
    path: Result<Path<CalculationId>, PathRejection>,
) -> ApiResult<()> {
    let Path(id) = path?;
    calculations::delete(&state, None, id).await
}
