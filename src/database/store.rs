use async_trait::async_trait;
use thiserror::Error;

use crate::calculation::model::{Calculation, CalculationPatch, NewCalculation};
use crate::calculation::operation::OperationError;
use crate::database::models::{NewUser, User};
use crate::types::{CalculationId, UserId};

/// Errors surfaced by record stores
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Uniqueness conflict: {0}")]
    UniquenessConflict(String),

    #[error("Update rejected: {0}")]
    Rejected(OperationError),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let what = db_err
                    .constraint()
                    .map(str::to_string)
                    .unwrap_or_else(|| db_err.message().to_string());
                return StoreError::UniquenessConflict(what);
            }
        }
        StoreError::Backend(err.to_string())
    }
}

/// Validation hook run by [`CalculationStore::update`] against the merged
/// record, inside the store's atomic section.
pub type UpdateCheck<'a> = &'a (dyn Fn(&Calculation) -> Result<(), OperationError> + Send + Sync);

/// Keyed persistence for calculation records.
///
/// `owner: None` means unscoped access. `owner: Some(id)` restricts every
/// lookup to records owned by `id`, applied as part of the same predicate as
/// the id match.
#[async_trait]
pub trait CalculationStore: Send + Sync {
    async fn insert(&self, new: NewCalculation) -> Result<Calculation, StoreError>;

    async fn find(
        &self,
        id: CalculationId,
        owner: Option<UserId>,
    ) -> Result<Option<Calculation>, StoreError>;

    async fn find_all(&self, owner: Option<UserId>) -> Result<Vec<Calculation>, StoreError>;

    /// Read, merge `patch`, run `check`, write. The whole sequence is atomic
    /// per record. Returns `Ok(None)` when no visible record matches and
    /// `Err(StoreError::Rejected)` when `check` refuses the merged state, in
    /// which case nothing is written.
    async fn update(
        &self,
        id: CalculationId,
        owner: Option<UserId>,
        patch: &CalculationPatch,
        check: UpdateCheck<'_>,
    ) -> Result<Option<Calculation>, StoreError>;

    async fn delete(&self, id: CalculationId, owner: Option<UserId>) -> Result<bool, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Keyed persistence for users. Username and email are unique.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, new: NewUser) -> Result<User, StoreError>;

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
}
