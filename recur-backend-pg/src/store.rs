//! A `Store` backed by a single Postgres table, demonstrating the
//! "cloud-hosted KV table" shape named in the design doc's scope note.
//!
//! CAS is implemented the way the teacher codebase's own database layer
//! expresses optimistic concurrency: a conditional `UPDATE ... WHERE`
//! whose `rows_affected()` tells the caller whether the compare
//! succeeded, rather than a client-side lock.

use async_trait::async_trait;
use recur_core::{RecurError, Store, StoreKey};
use sqlx::PgPool;

/// A Postgres-backed [`Store`] over a single `recur_kv(namespace, id,
/// value)` table, keyed on `(namespace, id)`.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects to `pool` and ensures the backing table exists.
    ///
    /// Table creation here (rather than a `sqlx::migrate!` directory) is
    /// a deliberate simplification for this demo backend — a production
    /// deployment would own its schema through the same migration
    /// tooling the rest of the workspace uses.
    pub async fn new(pool: PgPool) -> Result<Self, RecurError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS recur_kv (
                namespace TEXT NOT NULL,
                id        TEXT NOT NULL,
                value     BYTEA NOT NULL,
                PRIMARY KEY (namespace, id)
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| RecurError::Backend(e.to_string()))?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl Store for PgStore {
    async fn has(&self, key: &StoreKey) -> Result<bool, RecurError> {
        let row: Option<(i32,)> = sqlx::query_as(
            "SELECT 1 FROM recur_kv WHERE namespace = $1 AND id = $2",
        )
        .bind(key.namespace)
        .bind(&key.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RecurError::Backend(e.to_string()))?;
        Ok(row.is_some())
    }

    async fn get(&self, key: &StoreKey) -> Result<Vec<u8>, RecurError> {
        let row: Option<(Vec<u8>,)> = sqlx::query_as(
            "SELECT value FROM recur_kv WHERE namespace = $1 AND id = $2",
        )
        .bind(key.namespace)
        .bind(&key.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RecurError::Backend(e.to_string()))?;
        row.map(|(value,)| value).ok_or(RecurError::NotFound)
    }

    async fn set(&self, key: &StoreKey, value: Vec<u8>) -> Result<(), RecurError> {
        sqlx::query(
            "INSERT INTO recur_kv (namespace, id, value) VALUES ($1, $2, $3)
             ON CONFLICT (namespace, id) DO UPDATE SET value = excluded.value",
        )
        .bind(key.namespace)
        .bind(&key.id)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| RecurError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, key: &StoreKey) -> Result<(), RecurError> {
        sqlx::query("DELETE FROM recur_kv WHERE namespace = $1 AND id = $2")
            .bind(key.namespace)
            .bind(&key.id)
            .execute(&self.pool)
            .await
            .map_err(|e| RecurError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn set_new_value(&self, key: &StoreKey, value: Vec<u8>) -> Result<(), RecurError> {
        let result = sqlx::query(
            "INSERT INTO recur_kv (namespace, id, value) VALUES ($1, $2, $3)
             ON CONFLICT (namespace, id) DO NOTHING",
        )
        .bind(key.namespace)
        .bind(&key.id)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| RecurError::Backend(e.to_string()))?;
        if result.rows_affected() == 1 {
            Ok(())
        } else {
            Err(RecurError::CompareMismatch)
        }
    }

    async fn compare_and_set(
        &self,
        key: &StoreKey,
        new: Vec<u8>,
        expected: &[u8],
    ) -> Result<(), RecurError> {
        let result = sqlx::query(
            "UPDATE recur_kv SET value = $3 WHERE namespace = $1 AND id = $2 AND value = $4",
        )
        .bind(key.namespace)
        .bind(&key.id)
        .bind(new)
        .bind(expected)
        .execute(&self.pool)
        .await
        .map_err(|e| RecurError::Backend(e.to_string()))?;
        if result.rows_affected() == 1 {
            Ok(())
        } else {
            Err(RecurError::CompareMismatch)
        }
    }

    async fn compare_and_delete(&self, key: &StoreKey, expected: &[u8]) -> Result<(), RecurError> {
        let result = sqlx::query(
            "DELETE FROM recur_kv WHERE namespace = $1 AND id = $2 AND value = $3",
        )
        .bind(key.namespace)
        .bind(&key.id)
        .bind(expected)
        .execute(&self.pool)
        .await
        .map_err(|e| RecurError::Backend(e.to_string()))?;
        if result.rows_affected() == 1 {
            Ok(())
        } else {
            Err(RecurError::CompareMismatch)
        }
    }
}
