// handlers/public/system.rs - GET / and GET /health

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::api::AppState;
use crate::calculation::CalculationType;
use crate::middleware::ApiResponse;

/// GET / - Service description
pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    let mut endpoints = json!({
        "home": "/ (public)",
        "health": "/health (public)",
        "public_auth": "/register, /login, /auth/register, /auth/login (public - token acquisition)",
        "users": "/users, /users/register, /users/login, /users/:id (public)",
        "auth": "/api/auth/whoami (protected)",
        "calculations": "/api/calculations[/:id] (protected)",
    });
    if state.config.api.enable_public_calculations {
        endpoints["legacy_calculations"] = json!("/calculations[/:id] (public, unscoped)");
    }

    ApiResponse::success(json!({
        "name": "Calculator API (Rust)",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Authenticated calculator service built with Rust (Axum)",
        "operations": CalculationType::ALL.iter().map(CalculationType::as_str).collect::<Vec<_>>(),
        "endpoints": endpoints,
    }))
}

/// GET /health - Store liveness
pub async fn health(State(state): State<AppState>) -> Response {
    let now = chrono::Utc::now();

    match state.calculations.health_check().await {
        Ok(()) => ApiResponse::success(json!({
            "status": "ok",
            "timestamp": now,
            "database": "ok"
        }))
        .into_response(),
        Err(e) => {
            tracing::error!("health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
                .into_response()
        }
    }
}
