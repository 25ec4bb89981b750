use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use super::model::{Calculation, CalculationPatch, CalculationView, NewCalculation};
use super::operation::{self, OperationError, OperationTag};
use crate::database::store::{CalculationStore, StoreError};
use crate::types::{CalculationId, UserId};

#[derive(Debug, Error)]
pub enum CalculationError {
    #[error(transparent)]
    Validation(#[from] OperationError),

    /// Missing, or owned by someone else. The two are never distinguished.
    #[error("Calculation {0} not found")]
    NotFound(CalculationId),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl From<StoreError> for CalculationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniquenessConflict(what) => CalculationError::Conflict(what),
            StoreError::Rejected(reason) => CalculationError::Validation(reason),
            StoreError::Backend(msg) => CalculationError::Store(msg),
        }
    }
}

/// CRUD over calculation records with owner scoping.
///
/// Every `owner` argument follows the same rule: `None` is unscoped access,
/// `Some(user)` only sees records owned by `user`.
#[derive(Clone)]
pub struct CalculationService {
    store: Arc<dyn CalculationStore>,
}

impl CalculationService {
    pub fn new(store: Arc<dyn CalculationStore>) -> Self {
        Self { store }
    }

    /// Validate the type tag and divisor, then persist.
    pub async fn create<T>(
        &self,
        a: f64,
        b: f64,
        tag: &T,
        owner: Option<UserId>,
    ) -> Result<Calculation, CalculationError>
    where
        T: OperationTag + Sync + ?Sized,
    {
        let kind = operation::resolve(tag)?.kind();
        operation::validate(kind, b)?;

        let calculation = self
            .store
            .insert(NewCalculation {
                a,
                b,
                kind,
                user_id: owner,
            })
            .await?;

        debug!(id = calculation.id, %kind, ?owner, "created calculation");
        Ok(calculation)
    }

    pub async fn get(
        &self,
        id: CalculationId,
        owner: Option<UserId>,
    ) -> Result<Calculation, CalculationError> {
        self.store
            .find(id, owner)
            .await?
            .ok_or(CalculationError::NotFound(id))
    }

    /// Ordering is not part of the contract.
    pub async fn list(&self, owner: Option<UserId>) -> Result<Vec<Calculation>, CalculationError> {
        Ok(self.store.find_all(owner).await?)
    }

    /// Apply the present fields of `patch`, re-validating the merged record
    /// before anything is written.
    pub async fn update(
        &self,
        id: CalculationId,
        patch: &CalculationPatch,
        owner: Option<UserId>,
    ) -> Result<Calculation, CalculationError> {
        if patch.is_empty() {
            return self.get(id, owner).await;
        }

        let check = |merged: &Calculation| operation::validate(merged.kind, merged.b);

        let calculation = self
            .store
            .update(id, owner, patch, &check)
            .await?
            .ok_or(CalculationError::NotFound(id))?;

        debug!(id, ?owner, "updated calculation");
        Ok(calculation)
    }

    pub async fn delete(&self, id: CalculationId, owner: Option<UserId>) -> Result<(), CalculationError> {
        if !self.store.delete(id, owner).await? {
            return Err(CalculationError::NotFound(id));
        }

        debug!(id, ?owner, "deleted calculation");
        Ok(())
    }

    /// Always recomputed from the current fields.
    pub fn result_of(&self, calculation: &Calculation) -> Result<f64, CalculationError> {
        Ok(operation::compute(&calculation.kind, calculation.a, calculation.b)?)
    }

    pub fn view(&self, calculation: Calculation) -> Result<CalculationView, CalculationError> {
        let result = self.result_of(&calculation)?;
        Ok(CalculationView { calculation, result })
    }

    pub fn view_all(
        &self,
        calculations: Vec<Calculation>,
    ) -> Result<Vec<CalculationView>, CalculationError> {
        calculations.into_iter().map(|calc| self.view(calc)).collect()
    }

    pub async fn health_check(&self) -> Result<(), CalculationError> {
        Ok(self.store.health_check().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::operation::CalculationType;
    use crate::database::memory::MemoryStore;
    use crate::database::store::UpdateCheck;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn service() -> CalculationService {
        CalculationService::new(Arc::new(MemoryStore::new()))
    }

    /// Counts store calls and reports a uniqueness conflict on insert.
    #[derive(Default)]
    struct ConflictingStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CalculationStore for ConflictingStore {
        async fn insert(&self, _new: NewCalculation) -> Result<Calculation, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::UniquenessConflict("calculations_pkey".to_string()))
        }

        async fn find(&self, _: CalculationId, _: Option<UserId>) -> Result<Option<Calculation>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }

        async fn find_all(&self, _: Option<UserId>) -> Result<Vec<Calculation>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![])
        }

        async fn update(
            &self,
            _: CalculationId,
            _: Option<UserId>,
            _: &CalculationPatch,
            _: UpdateCheck<'_>,
        ) -> Result<Option<Calculation>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }

        async fn delete(&self, _: CalculationId, _: Option<UserId>) -> Result<bool, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(false)
        }
    }

    #[tokio::test]
    async fn create_then_read_computes_result() {
        let svc = service();
        let calc = svc.create(10.0, 5.0, &CalculationType::Add, None).await.unwrap();

        let read = svc.get(calc.id, None).await.unwrap();
        assert_eq!(svc.result_of(&read).unwrap(), 15.0);
    }

    #[tokio::test]
    async fn concrete_scenarios() {
        let svc = service();

        let divide = svc.create(20.0, 4.0, "Divide", None).await.unwrap();
        assert_eq!(svc.result_of(&divide).unwrap(), 5.0);

        let multiply = svc.create(7.0, 6.0, "Multiply", None).await.unwrap();
        assert_eq!(svc.result_of(&multiply).unwrap(), 42.0);

        let err = svc.create(10.0, 0.0, "Divide", None).await.unwrap_err();
        assert!(matches!(err, CalculationError::Validation(OperationError::DivisionByZero)));
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_the_store() {
        let store = Arc::new(ConflictingStore::default());
        let svc = CalculationService::new(store.clone());

        let err = svc.create(1.0, 0.0, "Divide", None).await.unwrap_err();
        assert!(matches!(err, CalculationError::Validation(_)));

        let err = svc.create(1.0, 2.0, "Power", None).await.unwrap_err();
        assert!(matches!(
            err,
            CalculationError::Validation(OperationError::InvalidOperationType(ref tag)) if tag == "Power"
        ));

        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn store_conflicts_surface_as_conflict() {
        let svc = CalculationService::new(Arc::new(ConflictingStore::default()));
        let err = svc.create(1.0, 2.0, "Add", Some(1)).await.unwrap_err();
        assert!(matches!(err, CalculationError::Conflict(_)));
    }

    #[tokio::test]
    async fn partial_update_keeps_omitted_fields() {
        let svc = service();
        let calc = svc.create(10.0, 5.0, "Add", Some(1)).await.unwrap();

        let patch = CalculationPatch {
            a: Some(30.0),
            ..Default::default()
        };
        let updated = svc.update(calc.id, &patch, Some(1)).await.unwrap();

        assert_eq!(updated.a, 30.0);
        assert_eq!(updated.b, 5.0);
        assert_eq!(updated.kind, CalculationType::Add);
        assert_eq!(svc.result_of(&updated).unwrap(), 35.0);

        // Reads see the new operands immediately
        let read = svc.get(calc.id, Some(1)).await.unwrap();
        assert_eq!(svc.result_of(&read).unwrap(), 35.0);
    }

    #[tokio::test]
    async fn update_validates_merged_state() {
        let svc = service();
        let calc = svc.create(8.0, 4.0, "Divide", None).await.unwrap();

        let zero_divisor = CalculationPatch {
            b: Some(0.0),
            ..Default::default()
        };
        let err = svc.update(calc.id, &zero_divisor, None).await.unwrap_err();
        assert!(matches!(err, CalculationError::Validation(OperationError::DivisionByZero)));
        assert_eq!(svc.get(calc.id, None).await.unwrap().b, 4.0);

        // Leaving Divide in the same patch makes b = 0 acceptable
        let to_multiply = CalculationPatch {
            b: Some(0.0),
            kind: Some(CalculationType::Multiply),
            ..Default::default()
        };
        let updated = svc.update(calc.id, &to_multiply, None).await.unwrap();
        assert_eq!(svc.result_of(&updated).unwrap(), 0.0);

        // Switching back to Divide while the stored b is 0 is refused
        let to_divide = CalculationPatch {
            kind: Some(CalculationType::Divide),
            ..Default::default()
        };
        let err = svc.update(calc.id, &to_divide, None).await.unwrap_err();
        assert!(matches!(err, CalculationError::Validation(_)));
        assert_eq!(svc.get(calc.id, None).await.unwrap().kind, CalculationType::Multiply);
    }

    #[tokio::test]
    async fn foreign_and_missing_records_are_not_found() {
        let svc = service();
        let owner_a = 1;
        let owner_b = 2;
        let x = svc.create(1.0, 2.0, "Add", Some(owner_a)).await.unwrap();

        assert!(matches!(svc.get(x.id, Some(owner_b)).await, Err(CalculationError::NotFound(_))));
        assert!(matches!(svc.get(999, Some(owner_a)).await, Err(CalculationError::NotFound(999))));

        let patch = CalculationPatch {
            a: Some(5.0),
            ..Default::default()
        };
        assert!(matches!(
            svc.update(x.id, &patch, Some(owner_b)).await,
            Err(CalculationError::NotFound(_))
        ));
        assert!(matches!(svc.delete(x.id, Some(owner_b)).await, Err(CalculationError::NotFound(_))));

        // Owner A's record survived all of that
        assert_eq!(svc.get(x.id, Some(owner_a)).await.unwrap().a, 1.0);
    }

    #[tokio::test]
    async fn empty_patch_is_a_read() {
        let store = Arc::new(ConflictingStore::default());
        let svc = CalculationService::new(store.clone());

        let err = svc.update(5, &CalculationPatch::default(), Some(1)).await.unwrap_err();
        assert!(matches!(err, CalculationError::NotFound(5)));
        // Only the lookup reached the store
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn delete_twice_is_not_found() {
        let svc = service();
        let calc = svc.create(1.0, 1.0, "Sub", None).await.unwrap();

        svc.delete(calc.id, None).await.unwrap();
        assert!(matches!(svc.get(calc.id, None).await, Err(CalculationError::NotFound(_))));
        assert!(matches!(svc.delete(calc.id, None).await, Err(CalculationError::NotFound(_))));
    }

    #[tokio::test]
    async fn list_is_scoped_to_owner() {
        let svc = service();
        let user = 10;
        let other = 11;
        for i in 0..3 {
            svc.create(i as f64, 1.0, "Add", Some(user)).await.unwrap();
        }
        svc.create(9.0, 9.0, "Multiply", Some(other)).await.unwrap();

        let mine = svc.list(Some(user)).await.unwrap();
        assert_eq!(mine.len(), 3);
        assert!(mine.iter().all(|c| c.user_id == Some(user)));

        assert_eq!(svc.list(None).await.unwrap().len(), 4);
    }

    #[test]
    fn read_time_divide_by_zero_is_reported() {
        let svc = service();
        // Only reachable through writes that bypass the service
        let corrupt = Calculation {
            id: 1,
            a: 1.0,
            b: 0.0,
            kind: CalculationType::Divide,
            user_id: None,
        };
        assert!(matches!(
            svc.view(corrupt),
            Err(CalculationError::Validation(OperationError::DivisionByZero))
        ));
    }
}
