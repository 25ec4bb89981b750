//! bcrypt password hashes.

pub use bcrypt::{BcryptError, DEFAULT_COST};

/// Lowest and highest work factors bcrypt accepts.
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

pub fn hash_password(plain: &str, cost: u32) -> Result<String, BcryptError> {
    bcrypt::hash(plain, cost)
}

/// Returns false for malformed hashes rather than erroring.
pub fn verify_password(plain: &str, stored: &str) -> bool {
    match bcrypt::verify(plain, stored) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!("unreadable password hash: {}", e);
            false
        }
    }
}
