//! Atomic sequence store backed by the `id_sequences` table.

use async_trait::async_trait;
use baitech_core::models::SequenceScope;
use baitech_core::AppError;
use sqlx::{PgPool, Postgres};
use std::sync::Arc;

/// Reserves sequence values per scope.
///
/// Each call returns a value no other caller has received for the same scope.
/// The first value of a fresh scope is 1.
#[async_trait]
pub trait SequenceStore: Send + Sync {
    async fn next_value(&self, scope: &SequenceScope) -> Result<i64, AppError>;
}

#[async_trait]
impl<S: SequenceStore + ?Sized> SequenceStore for Arc<S> {
    async fn next_value(&self, scope: &SequenceScope) -> Result<i64, AppError> {
        (**self).next_value(scope).await
    }
}

/// Repository for the id_sequences table.
#[derive(Clone)]
pub struct PgSequenceStore {
    pool: PgPool,
}

impl PgSequenceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Current value of a scope without reserving a new one.
    #[tracing::instrument(skip(self), fields(db.table = "id_sequences", db.operation = "select"))]
    pub async fn current_value(&self, scope: &SequenceScope) -> Result<Option<i64>, AppError> {
        let value = sqlx::query_scalar::<Postgres, i64>(
            "SELECT value FROM id_sequences WHERE scope = $1",
        )
        .bind(scope.key())
        .fetch_optional(&self.pool)
        .await?;
        Ok(value)
    }
}

#[async_trait]
impl SequenceStore for PgSequenceStore {
    #[tracing::instrument(skip(self), fields(db.table = "id_sequences", db.operation = "upsert"))]
    async fn next_value(&self, scope: &SequenceScope) -> Result<i64, AppError> {
        let value = sqlx::query_scalar::<Postgres, i64>(
            r#"
            INSERT INTO id_sequences (scope, value)
            VALUES ($1, 1)
            ON CONFLICT (scope)
            DO UPDATE SET value = id_sequences.value + 1, updated_at = NOW()
            RETURNING value
            "#,
        )
        .bind(scope.key())
        .fetch_one(&self.pool)
        .await?;

        Ok(value)
    }
}
