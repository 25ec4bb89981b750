/// Shared identifier types used across the codebase

/// Store-assigned identity of a user. Opaque to callers.
pub type UserId = i64;

/// Store-assigned identity of a calculation record. Opaque to callers.
pub type CalculationId = i64;
