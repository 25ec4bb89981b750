// handlers/public/users.rs - Account endpoints that answer with the user

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    extract::{Path, State},
    Json,
};

use crate::api::AppState;
use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{UserCreate, UserLogin};
use crate::types::UserId;

/// POST /users/register - 201 with the new user
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<UserCreate>, JsonRejection>,
) -> ApiResult<User> {
    let Json(body) = payload?;
    let user = state.users.register(&body).await?;
    Ok(ApiResponse::created(user))
}

/// POST /users/login - Username or email plus password
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<UserLogin>, JsonRejection>,
) -> ApiResult<User> {
    let Json(body) = payload?;
    let user = state.users.authenticate(&body).await?;
    Ok(ApiResponse::success(user))
}

/// GET /users/:id
pub async fn get(
    State(state): State<AppState>,
    path: Result<Path<UserId>, PathRejection>,
) -> ApiResult<User> {
    let Path(id) = path?;
    Ok(ApiResponse::success(state.users.find(id).await?))
}
