// handlers/protected/calculations.rs - /api/calculations, scoped to the caller
//
// Another user's record answers exactly like a missing one (404).

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    extract::{Extension, Path, State},
    Json,
};

use crate::api::AppState;
use crate::calculation::CalculationView;
use crate::handlers::calculations::{self, CalculationCreate, CalculationUpdate};
use crate::middleware::{ApiResult, AuthUser};
use crate::types::CalculationId;

/// POST /api/calculations
pub async fn create(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<CalculationCreate>, JsonRejection>,
) -> ApiResult<CalculationView> {
    let Json(body) = payload?;
    calculations::create(&state, Some(auth_user.user_id), body).await
}

/// GET /api/calculations
pub async fn list(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Vec<CalculationView>> {
    calculations::list(&state, Some(auth_user.user_id)).await
}

/// GET /api/calculations/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    path: Result<Path<CalculationId>, PathRejection>,
) -> ApiResult<CalculationView> {
    let Path(id) = path?;
    calculations::get(&state, Some(auth_user.user_id), id).await
}

/// PUT|PATCH /api/calculations/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    path: Result<Path<CalculationId>, PathRejection>,
    payload: Result<Json<CalculationUpdate>, JsonRejection>,
) -> ApiResult<CalculationView> {
    let Path(id) = path?;
    let Json(body) = payload?;
    calculations::update(&state, Some(auth_user.user_id), id, body).await
}

/// DELETE /api/calculations/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    path: Result<Path<CalculationId>, PathRejection>,
) -> ApiResult<()> {
    let Path(id) = path?;
    calculations::delete(&state, Some(auth_user.user_id), id).await
}
