//! Storage layer.
//!
//! Every entity kind is reached through a [`Repository`]. Two backends exist:
//! [`memory::MemoryRepository`] for tests and local development, and
//! [`postgres::PgRepository`] for durable deployments. [`Store`] bundles one
//! repository per entity kind and is cloned into every request.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;

pub use manager::{DatabaseError, DatabaseManager};
pub use models::{
    ChecklistItem, ChecklistResponse, ChecklistSubmission, ChecklistTemplate, Document,
    DocumentFolder, Incident, IncidentPatch, IncidentSeverity, IncidentStatus, Message,
    MessageGroup, PublicUser, Shipment, ShipmentDirection, ShipmentPatch, ShipmentStatus,
    SubmissionStatus, TemplatePatch, Tenant, TenantPatch, User, UserPatch,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    /// A unique key (by field name) is already taken.
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unexpected(err.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A persisted record kind.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    /// Discriminator stored alongside every row.
    const KIND: &'static str;

    /// Partial update accepted by [`Repository::update`].
    type Patch: Send + 'static;

    fn id(&self) -> Uuid;

    /// Owning tenant. A tenant's own scope is its id.
    fn tenant_id(&self) -> Option<Uuid>;

    fn created_at(&self) -> DateTime<Utc>;

    /// `(field, lowercased value)` pairs that must be unique across the kind.
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn apply(&mut self, patch: Self::Patch);
}

/// CRUD over one entity kind. `tenant_id = None` means unscoped.
///
/// Misses are `Ok(None)` / `Ok(false)`, never errors.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    async fn get_all(&self, tenant_id: Option<Uuid>) -> StoreResult<Vec<E>>;
    async fn get_by_id(&self, id: Uuid) -> StoreResult<Option<E>>;
    async fn find_unique(&self, key: &str, value: &str) -> StoreResult<Option<E>>;
    async fn create(&self, entity: E) -> StoreResult<E>;
    async fn update(
        &self,
        id: Uuid,
        patch: E::Patch,
        tenant_id: Option<Uuid>,
    ) -> StoreResult<Option<E>>;
    async fn delete(&self, id: Uuid, tenant_id: Option<Uuid>) -> StoreResult<bool>;
}

#[derive(Clone)]
enum Backend {
    Memory,
    Postgres(PgPool),
}

/// One repository per entity kind, sharing a backend.
#[derive(Clone)]
pub struct Store {
    pub tenants: Arc<dyn Repository<Tenant>>,
    pub users: Arc<dyn Repository<User>>,
    pub templates: Arc<dyn Repository<ChecklistTemplate>>,
    pub submissions: Arc<dyn Repository<ChecklistSubmission>>,
    pub incidents: Arc<dyn Repository<Incident>>,
    pub message_groups: Arc<dyn Repository<MessageGroup>>,
    pub messages: Arc<dyn Repository<Message>>,
    pub shipments: Arc<dyn Repository<Shipment>>,
    pub folders: Arc<dyn Repository<DocumentFolder>>,
    pub documents: Arc<dyn Repository<Document>>,
    backend: Backend,
}

impl Store {
    /// Non-durable store; state is lost on restart.
    pub fn in_memory() -> Self {
        use memory::MemoryRepository as M;

        Self {
            tenants: Arc::new(M::<Tenant>::new()),
            users: Arc::new(M::<User>::new()),
            templates: Arc::new(M::<ChecklistTemplate>::new()),
            submissions: Arc::new(M::<ChecklistSubmission>::new()),
            incidents: Arc::new(M::<Incident>::new()),
            message_groups: Arc::new(M::<MessageGroup>::new()),
            messages: Arc::new(M::<Message>::new()),
            shipments: Arc::new(M::<Shipment>::new()),
            folders: Arc::new(M::<DocumentFolder>::new()),
            documents: Arc::new(M::<Document>::new()),
            backend: Backend::Memory,
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        use postgres::PgRepository as P;

        Self {
            tenants: Arc::new(P::<Tenant>::new(pool.clone())),
            users: Arc::new(P::<User>::new(pool.clone())),
            templates: Arc::new(P::<ChecklistTemplate>::new(pool.clone())),
            submissions: Arc::new(P::<ChecklistSubmission>::new(pool.clone())),
            incidents: Arc::new(P::<Incident>::new(pool.clone())),
            message_groups: Arc::new(P::<MessageGroup>::new(pool.clone())),
            messages: Arc::new(P::<Message>::new(pool.clone())),
            shipments: Arc::new(P::<Shipment>::new(pool.clone())),
            folders: Arc::new(P::<DocumentFolder>::new(pool.clone())),
            documents: Arc::new(P::<Document>::new(pool.clone())),
            backend: Backend::Postgres(pool),
        }
    }

    pub async fn health_check(&self) -> StoreResult<()> {
        match &self.backend {
            Backend::Memory => Ok(()),
            Backend::Postgres(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
                Ok(())
            }
        }
    }

    pub fn is_durable(&self) -> bool {
        matches!(self.backend, Backend::Postgres(_))
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Memory => "memory",
            Backend::Postgres(_) => "postgres",
        }
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("backend", &self.backend_name())
            .finish_non_exhaustive()
    }
}
