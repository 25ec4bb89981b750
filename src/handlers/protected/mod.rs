// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Route prefix: /api/*. `jwt_auth_middleware` runs first and injects the
// `AuthUser` every handler here scopes its work to.

pub mod auth;
pub mod calculations;
