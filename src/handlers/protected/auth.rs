use axum::extract::{Extension, State};

use crate::api::AppState;
use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/auth/whoami - The account behind the bearer token
pub async fn whoami(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<User> {
    Ok(ApiResponse::success(state.users.find(auth_user.user_id).await?))
}
