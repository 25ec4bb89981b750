// handlers/public/auth.rs - Token acquisition
//
// POST /[auth/]register and POST /[auth/]login both answer with a bearer token:
// { "access_token": "...", "token_type": "bearer" }

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;

use crate::api::AppState;
use crate::auth::AccessToken;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{UserError, UserLogin, UserRegister};

#[derive(Debug, Deserialize)]
pub struct EmailLogin {
    pub email: String,
    pub password: String,
}

/// POST /auth/register - Create an account from email + password and sign in
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<UserRegister>, JsonRejection>,
) -> ApiResult<AccessToken> {
    let Json(body) = payload?;
    let user = state.users.register_with_email(&body).await?;
    Ok(ApiResponse::success(state.users.issue_token(&user)?))
}

/// POST /auth/login - Exchange email + password for a token
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<EmailLogin>, JsonRejection>,
) -> ApiResult<AccessToken> {
    let Json(body) = payload?;
    let credentials = UserLogin {
        username: None,
        email: Some(body.email),
        password: body.password,
    };

    let user = state.users.authenticate(&credentials).await.map_err(|e| match e {
        UserError::InvalidCredentials => ApiError::unauthorized("Incorrect email or password"),
        other => other.into(),
    })?;

    Ok(ApiResponse::success(state.users.issue_token(&user)?))
}
