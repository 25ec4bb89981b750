use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::calculation::model::{Calculation, CalculationPatch, NewCalculation};
use crate::database::models::{NewUser, User};
use crate::database::store::{CalculationStore, StoreError, UpdateCheck, UserStore};
use crate::types::{CalculationId, UserId};

/// In-process store used when no `DATABASE_URL` is configured, and by tests.
///
/// One write lock covers each mutation, which gives the per-record atomicity
/// the update contract asks for.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    calculations: BTreeMap<CalculationId, Calculation>,
    users: BTreeMap<UserId, User>,
    last_calculation_id: CalculationId,
    last_user_id: UserId,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CalculationStore for MemoryStore {
    async fn insert(&self, new: NewCalculation) -> Result<Calculation, StoreError> {
        let mut state = self.state.write().await;
        state.last_calculation_id += 1;

        let calculation = Calculation {
            id: state.last_calculation_id,
            a: new.a,
            b: new.b,
            kind: new.kind,
            user_id: new.user_id,
        };
        state.calculations.insert(calculation.id, calculation.clone());
        Ok(calculation)
    }

    async fn find(
        &self,
        id: CalculationId,
        owner: Option<UserId>,
    ) -> Result<Option<Calculation>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .calculations
            .get(&id)
            .filter(|calc| calc.is_visible_to(owner))
            .cloned())
    }

    async fn find_all(&self, owner: Option<UserId>) -> Result<Vec<Calculation>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .calculations
            .values()
            .filter(|calc| calc.is_visible_to(owner))
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        id: CalculationId,
        owner: Option<UserId>,
        patch: &CalculationPatch,
        check: UpdateCheck<'_>,
    ) -> Result<Option<Calculation>, StoreError> {
        let mut state = self.state.write().await;
        let Some(stored) = state
            .calculations
            .get_mut(&id)
            .filter(|calc| calc.is_visible_to(owner))
        else {
            return Ok(None);
        };

        // Merge into a copy so a rejected patch leaves the stored row intact
        let mut merged = stored.clone();
        merged.apply(patch);
        check(&merged).map_err(StoreError::Rejected)?;

        *stored = merged.clone();
        Ok(Some(merged))
    }

    async fn delete(&self, id: CalculationId, owner: Option<UserId>) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let visible = state
            .calculations
            .get(&id)
            .is_some_and(|calc| calc.is_visible_to(owner));

        if visible {
            state.calculations.remove(&id);
        }
        Ok(visible)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut state = self.state.write().await;

        if state.users.values().any(|u| u.username == new.username) {
            return Err(StoreError::UniquenessConflict("users_username_key".to_string()));
        }
        if state.users.values().any(|u| u.email == new.email) {
            return Err(StoreError::UniquenessConflict("users_email_key".to_string()));
        }

        state.last_user_id += 1;
        let user = User {
            id: state.last_user_id,
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::operation::{self, CalculationType, OperationError};

    fn new_calc(a: f64, b: f64, kind: CalculationType, user_id: Option<UserId>) -> NewCalculation {
        NewCalculation { a, b, kind, user_id }
    }

    fn divisor_check(calc: &Calculation) -> Result<(), OperationError> {
        operation::validate(calc.kind, calc.b)
    }

    #[tokio::test]
    async fn assigns_increasing_ids() {
        let store = MemoryStore::new();
        let first = store.insert(new_calc(1.0, 2.0, CalculationType::Add, None)).await.unwrap();
        let second = store.insert(new_calc(3.0, 4.0, CalculationType::Sub, None)).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn owner_scoping_hides_foreign_records() {
        let store = MemoryStore::new();
        let calc = store
            .insert(new_calc(1.0, 2.0, CalculationType::Add, Some(1)))
            .await
            .unwrap();

        assert!(store.find(calc.id, Some(1)).await.unwrap().is_some());
        assert!(store.find(calc.id, None).await.unwrap().is_some());
        assert!(store.find(calc.id, Some(2)).await.unwrap().is_none());
        assert!(!store.delete(calc.id, Some(2)).await.unwrap());
        assert!(store.delete(calc.id, Some(1)).await.unwrap());
        assert!(!store.delete(calc.id, Some(1)).await.unwrap());
    }

    #[tokio::test]
    async fn rejected_update_leaves_record_untouched() {
        let store = MemoryStore::new();
        let calc = store
            .insert(new_calc(8.0, 4.0, CalculationType::Divide, None))
            .await
            .unwrap();

        let patch = CalculationPatch {
            b: Some(0.0),
            ..Default::default()
        };
        let err = store.update(calc.id, None, &patch, &divisor_check).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected(OperationError::DivisionByZero)));

        let stored = store.find(calc.id, None).await.unwrap().unwrap();
        assert_eq!(stored.b, 4.0);
    }

    #[tokio::test]
    async fn duplicate_users_conflict() {
        let store = MemoryStore::new();
        let new_user = |username: &str, email: &str| NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "x".to_string(),
        };

        store.insert_user(new_user("alice", "alice@example.com")).await.unwrap();

        let by_name = store.insert_user(new_user("alice", "other@example.com")).await;
        assert!(matches!(by_name, Err(StoreError::UniquenessConflict(_))));

        let by_email = store.insert_user(new_user("bob", "alice@example.com")).await;
        assert!(matches!(by_email, Err(StoreError::UniquenessConflict(_))));

        let found = store.find_user_by_email("alice@example.com").await.unwrap().unwrap();
        assert_eq!(found.username, "alice");
        assert!(store.find_user_by_username("bob").await.unwrap().is_none());
    }
}
