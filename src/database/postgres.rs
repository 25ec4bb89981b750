use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::info;

use crate::calculation::model::{Calculation, CalculationPatch, NewCalculation};
use crate::calculation::operation::CalculationType;
use crate::database::models::{NewUser, User};
use crate::database::store::{CalculationStore, StoreError, UpdateCheck, UserStore};
use crate::types::{CalculationId, UserId};

const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        username VARCHAR(50) NOT NULL,
        email VARCHAR(255) NOT NULL,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT users_username_key UNIQUE (username),
        CONSTRAINT users_email_key UNIQUE (email)
    )
"#;

const CREATE_CALCULATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS calculations (
        id BIGSERIAL PRIMARY KEY,
        a DOUBLE PRECISION NOT NULL,
        b DOUBLE PRECISION NOT NULL,
        type VARCHAR(20) NOT NULL,
        user_id BIGINT NULL REFERENCES users(id)
    )
"#;

const CREATE_CALCULATIONS_USER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS calculations_user_id_idx ON calculations (user_id)";

// Ownership is part of the same predicate as the id match
const OWNED_BY: &str = "($2::BIGINT IS NULL OR user_id = $2)";

/// PostgreSQL-backed store for users and calculations.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct CalculationRow {
    id: CalculationId,
    a: f64,
    b: f64,
    #[sqlx(rename = "type")]
    kind: String,
    user_id: Option<UserId>,
}

impl TryFrom<CalculationRow> for Calculation {
    type Error = StoreError;

    fn try_from(row: CalculationRow) -> Result<Self, Self::Error> {
        let kind: CalculationType = row.kind.parse().map_err(|e| {
            StoreError::Backend(format!("calculation {} has a corrupt type column: {}", row.id, e))
        })?;

        Ok(Calculation {
            id: row.id,
            a: row.a,
            b: row.b,
            kind,
            user_id: row.user_id,
        })
    }
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create tables on first start. Safe to run repeatedly.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in [
            CREATE_USERS_TABLE,
            CREATE_CALCULATIONS_TABLE,
            CREATE_CALCULATIONS_USER_INDEX,
        ] {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database schema is up to date");
        Ok(())
    }
}

#[async_trait]
impl CalculationStore for PgStore {
    async fn insert(&self, new: NewCalculation) -> Result<Calculation, StoreError> {
        let row = sqlx::query_as::<_, CalculationRow>(
            "INSERT INTO calculations (a, b, type, user_id)
             VALUES ($1, $2, $3, $4)
             RETURNING id, a, b, type, user_id",
        )
        .bind(new.a)
        .bind(new.b)
        .bind(new.kind.as_str())
        .bind(new.user_id)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find(
        &self,
        id: CalculationId,
        owner: Option<UserId>,
    ) -> Result<Option<Calculation>, StoreError> {
        let query = format!(
            "SELECT id, a, b, type, user_id FROM calculations WHERE id = $1 AND {OWNED_BY}"
        );
        let row = sqlx::query_as::<_, CalculationRow>(&query)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Calculation::try_from).transpose()
    }

    async fn find_all(&self, owner: Option<UserId>) -> Result<Vec<Calculation>, StoreError> {
        let rows = sqlx::query_as::<_, CalculationRow>(
            "SELECT id, a, b, type, user_id FROM calculations
             WHERE ($1::BIGINT IS NULL OR user_id = $1)
             ORDER BY id",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Calculation::try_from).collect()
    }

    async fn update(
        &self,
        id: CalculationId,
        owner: Option<UserId>,
        patch: &CalculationPatch,
        check: UpdateCheck<'_>,
    ) -> Result<Option<Calculation>, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Row lock keeps concurrent updates from interleaving read and write
        let query = format!(
            "SELECT id, a, b, type, user_id FROM calculations
             WHERE id = $1 AND {OWNED_BY}
             FOR UPDATE"
        );
        let Some(row) = sqlx::query_as::<_, CalculationRow>(&query)
            .bind(id)
            .bind(owner)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let mut merged = Calculation::try_from(row)?;
        merged.apply(patch);
        // Dropping `tx` on rejection rolls back and releases the lock
        check(&merged).map_err(StoreError::Rejected)?;

        sqlx::query("UPDATE calculations SET a = $2, b = $3, type = $4 WHERE id = $1")
            .bind(merged.id)
            .bind(merged.a)
            .bind(merged.b)
            .bind(merged.kind.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(merged))
    }

    async fn delete(&self, id: CalculationId, owner: Option<UserId>) -> Result<bool, StoreError> {
        let query = format!("DELETE FROM calculations WHERE id = $1 AND {OWNED_BY}");
        let result = sqlx::query(&query)
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, new: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, password_hash)
             VALUES ($1, $2, $3)
             RETURNING id, username, email, password_hash, created_at",
        )
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_with_unknown_tags_are_reported() {
        let row = CalculationRow {
            id: 3,
            a: 1.0,
            b: 2.0,
            kind: "Power".to_string(),
            user_id: None,
        };
        let err = Calculation::try_from(row).unwrap_err();
        assert!(err.to_string().contains("Power"));
    }

    #[test]
    fn rows_convert_to_calculations() {
        let row = CalculationRow {
            id: 4,
            a: 6.0,
            b: 3.0,
            kind: "Divide".to_string(),
            user_id: Some(9),
        };
        let calc = Calculation::try_from(row).unwrap();
        assert_eq!(calc.kind, CalculationType::Divide);
        assert_eq!(calc.user_id, Some(9));
    }
}
