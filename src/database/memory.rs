//! In-memory repositories.
//!
//! Rows live in a `Vec` per entity kind behind a `tokio::sync::RwLock`, in
//! insertion order. Nothing survives a restart; use it for tests and local
//! development only. Unique keys are enforced on create and update under the
//! write lock.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Entity, Repository, StoreError, StoreResult};

pub struct MemoryRepository<E> {
    rows: RwLock<Vec<E>>,
}

impl<E: Entity> MemoryRepository<E> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }
}

impl<E: Entity> Default for MemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

fn in_scope<E: Entity>(row: &E, tenant_id: Option<Uuid>) -> bool {
    tenant_id.map_or(true, |tenant| row.tenant_id() == Some(tenant))
}

/// First unique key of `candidate` already held by another row.
fn taken_key<E: Entity>(rows: &[E], candidate: &E) -> Option<&'static str> {
    let wanted = candidate.unique_keys();
    if wanted.is_empty() {
        return None;
    }
    rows.iter()
        .filter(|row| row.id() != candidate.id())
        .find_map(|row| {
            let held = row.unique_keys();
            wanted
                .iter()
                .find(|(key, value)| held.iter().any(|(k, v)| k == key && v == value))
                .map(|(key, _)| *key)
        })
}

#[async_trait]
impl<E: Entity> Repository<E> for MemoryRepository<E> {
    async fn get_all(&self, tenant_id: Option<Uuid>) -> StoreResult<Vec<E>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|row| in_scope(*row, tenant_id))
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, id: Uuid) -> StoreResult<Option<E>> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|row| row.id() == id).cloned())
    }

    async fn find_unique(&self, key: &str, value: &str) -> StoreResult<Option<E>> {
        let value = value.to_lowercase();
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .find(|row| {
                row.unique_keys()
                    .iter()
                    .any(|(k, v)| *k == key && *v == value)
            })
            .cloned())
    }

    async fn create(&self, entity: E) -> StoreResult<E> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|row| row.id() == entity.id()) {
            return Err(StoreError::Conflict("id".to_string()));
        }
        if let Some(key) = taken_key(&rows, &entity) {
            return Err(StoreError::Conflict(key.to_string()));
        }
        rows.push(entity.clone());
        Ok(entity)
    }

    async fn update(
        &self,
        id: Uuid,
        patch: E::Patch,
        tenant_id: Option<Uuid>,
    ) -> StoreResult<Option<E>> {
        let mut rows = self.rows.write().await;
        let Some(index) = rows
            .iter()
            .position(|row| row.id() == id && in_scope(row, tenant_id))
        else {
            return Ok(None);
        };

        let mut updated = rows[index].clone();
        updated.apply(patch);
        if let Some(key) = taken_key(&rows, &updated) {
            return Err(StoreError::Conflict(key.to_string()));
        }
        rows[index] = updated.clone();
        Ok(Some(updated))
    }

    async fn delete(&self, id: Uuid, tenant_id: Option<Uuid>) -> StoreResult<bool> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|row| !(row.id() == id && in_scope(row, tenant_id)));
        Ok(rows.len() != before)
    }
}
