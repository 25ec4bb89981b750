use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::api::AppState;
use crate::auth;
use crate::database::models::User;
use crate::error::ApiError;
use crate::services::UserError;
use crate::types::UserId;

/// Authenticated user context resolved from the bearer token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

/// Validates the JWT, loads the user it names and injects `AuthUser`
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;

    let claims = auth::validate_jwt(token, &state.config.security).map_err(|e| {
        tracing::warn!("rejected bearer token: {}", e);
        ApiError::unauthorized("Invalid authentication credentials")
    })?;

    // Tokens outlive accounts; the user must still exist and match the subject
    let user = match state.users.find(claims.user_id).await {
        Ok(user) if user.email == claims.sub => user,
        Ok(_) | Err(UserError::NotFound(_)) => return Err(ApiError::unauthorized("User not found")),
        Err(e) => return Err(e.into()),
    };

    request.extensions_mut().insert(AuthUser::from(user));

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<&str, &'static str> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or("Missing Authorization header")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or("Authorization header must use Bearer token format")?
        .trim();

    if token.is_empty() {
        return Err("Empty JWT token");
    }
    Ok(token)
}
