//! Application state and router assembly.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::calculation::CalculationService;
use crate::config::AppConfig;
use crate::database::Stores;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::services::UserService;

/// Shared by every handler. Cloning is cheap: everything is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub calculations: CalculationService,
    pub users: UserService,
}

impl AppState {
    pub fn new(config: AppConfig, stores: Stores) -> Self {
        let config = Arc::new(config);
        let security = Arc::new(config.security.clone());

        Self {
            calculations: CalculationService::new(stores.calculations),
            users: UserService::new(stores.users, security),
            config,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let config = state.config.clone();

    let mut app = Router::new()
        // Public
        .route("/", get(public::system::root))
        .route("/health", get(public::system::health))
        .merge(auth_public_routes())
        .merge(user_routes());

    if config.api.enable_public_calculations {
        app = app.merge(public_calculation_routes());
    }

    let mut app = app
        // Protected API
        .merge(protected_routes(state.clone()))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .with_state(state);

    // Global middleware
    if config.security.enable_cors {
        app = app.layer(cors_layer(&config.security.cors_origins));
    }
    if config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }

    app
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
}

fn user_routes() -> Router<AppState> {
    use public::users;

    Router::new()
        // Plain create, kept for older clients
        .route("/users", post(users::register))
        .route("/users/", post(users::register))
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users/:id", get(users::get))
}

fn public_calculation_routes() -> Router<AppState> {
    use public::calculations;

    Router::new()
        .route("/calculations", post(calculations::create).get(calculations::list))
        .route(
            "/calculations/:id",
            get(calculations::get)
                .put(calculations::update)
                .patch(calculations::update)
                .delete(calculations::delete),
        )
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{auth, calculations};

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami))
        .route("/api/calculations", post(calculations::create).get(calculations::list))
        .route(
            "/api/calculations/:id",
            get(calculations::get)
                .put(calculations::update)
                .patch(calculations::update)
                .delete(calculations::delete),
        )
        // route_layer: unknown /api paths stay 404 instead of 401
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
