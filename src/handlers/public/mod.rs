// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition, user registration, service info and the legacy
// unscoped calculation collection.

pub mod auth;
pub mod calculations;
pub mod system;
pub mod users;
