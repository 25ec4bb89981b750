// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) and protected (JWT auth) handlers. Calculation CRUD is
// shared between the tiers and only differs in the owner scope it passes.

pub mod calculations;
pub mod protected;
pub mod public;
