//! PostgreSQL repositories.
//!
//! All kinds share one `entities` table: `(kind, id, tenant_id, body JSONB,
//! created_at)`. The JSON body is the serialized entity; `tenant_id` and
//! `created_at` are copied out of it for filtering and ordering. Unique keys
//! are enforced by partial expression indexes (see `migrations/`), and a
//! unique violation (SQLSTATE 23505) surfaces as [`StoreError::Conflict`].

use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use std::marker::PhantomData;
use uuid::Uuid;

use super::{Entity, Repository, StoreError, StoreResult};

pub struct PgRepository<E> {
    pool: PgPool,
    _entity: PhantomData<E>,
}

impl<E: Entity> PgRepository<E> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().map(|code| code == "23505").unwrap_or(false);
    }
    false
}

/// Translate a write failure, naming the unique key the index guards.
fn write_error<E: Entity>(err: sqlx::Error, entity: &E) -> StoreError {
    if !is_unique_violation(&err) {
        return err.into();
    }
    let constraint = match &err {
        sqlx::Error::Database(db_err) => db_err.constraint().unwrap_or_default().to_string(),
        _ => String::new(),
    };
    let key = entity
        .unique_keys()
        .into_iter()
        .map(|(key, _)| key)
        .find(|key| constraint.contains(&key.to_lowercase()))
        .unwrap_or("id");
    StoreError::Conflict(key.to_string())
}

#[async_trait]
impl<E: Entity> Repository<E> for PgRepository<E> {
    async fn get_all(&self, tenant_id: Option<Uuid>) -> StoreResult<Vec<E>> {
        let rows: Vec<Json<E>> = sqlx::query_scalar(
            r#"SELECT body FROM entities
               WHERE kind = $1 AND ($2::uuid IS NULL OR tenant_id = $2)
               ORDER BY created_at, id"#,
        )
        .bind(E::KIND)
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|Json(entity)| entity).collect())
    }

    async fn get_by_id(&self, id: Uuid) -> StoreResult<Option<E>> {
        let row: Option<Json<E>> =
            sqlx::query_scalar(r#"SELECT body FROM entities WHERE kind = $1 AND id = $2"#)
                .bind(E::KIND)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|Json(entity)| entity))
    }

    async fn find_unique(&self, key: &str, value: &str) -> StoreResult<Option<E>> {
        let row: Option<Json<E>> = sqlx::query_scalar(
            r#"SELECT body FROM entities
               WHERE kind = $1 AND lower(body ->> $2) = lower($3)
               LIMIT 1"#,
        )
        .bind(E::KIND)
        .bind(key)
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|Json(entity)| entity))
    }

    async fn create(&self, entity: E) -> StoreResult<E> {
        let inserted = sqlx::query(
            r#"INSERT INTO entities (kind, id, tenant_id, body, created_at)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(E::KIND)
        .bind(entity.id())
        .bind(entity.tenant_id())
        .bind(Json(&entity))
        .bind(entity.created_at())
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(entity),
            Err(err) => Err(write_error(err, &entity)),
        }
    }

    /// Read-modify-write under a row lock.
    async fn update(
        &self,
        id: Uuid,
        patch: E::Patch,
        tenant_id: Option<Uuid>,
    ) -> StoreResult<Option<E>> {
        let mut tx = self.pool.begin().await?;

        let current: Option<Json<E>> = sqlx::query_scalar(
            r#"SELECT body FROM entities
               WHERE kind = $1 AND id = $2 AND ($3::uuid IS NULL OR tenant_id = $3)
               FOR UPDATE"#,
        )
        .bind(E::KIND)
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(Json(mut entity)) = current else {
            return Ok(None);
        };
        entity.apply(patch);

        let written = sqlx::query(
            r#"UPDATE entities SET body = $3, tenant_id = $4 WHERE kind = $1 AND id = $2"#,
        )
        .bind(E::KIND)
        .bind(id)
        .bind(Json(&entity))
        .bind(entity.tenant_id())
        .execute(&mut *tx)
        .await;

        if let Err(err) = written {
            return Err(write_error(err, &entity));
        }

        tx.commit().await?;
        Ok(Some(entity))
    }

    async fn delete(&self, id: Uuid, tenant_id: Option<Uuid>) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"DELETE FROM entities
               WHERE kind = $1 AND id = $2 AND ($3::uuid IS NULL OR tenant_id = $3)"#,
        )
        .bind(E::KIND)
        .bind(id)
        .bind(tenant_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
