use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use uuid::Uuid;

use crate::database::Entity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentFolder {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl DocumentFolder {
    pub fn new(tenant_id: Uuid, created_by: Uuid, name: String, parent_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            name,
            parent_id,
            created_by,
            created_at: Utc::now(),
        }
    }
}

impl Entity for DocumentFolder {
    const KIND: &'static str = "document_folder";
    type Patch = Infallible;

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant_id(&self) -> Option<Uuid> {
        Some(self.tenant_id)
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn apply(&mut self, patch: Infallible) {
        match patch {}
    }
}

/// A link to a controlled document (SOP, drawing, spec sheet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub folder_id: Uuid,
    pub title: String,
    pub url: String,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn new(folder: &DocumentFolder, uploaded_by: Uuid, title: String, url: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id: folder.tenant_id,
            folder_id: folder.id,
            title,
            url,
            uploaded_by,
            created_at: Utc::now(),
        }
    }
}

impl Entity for Document {
    const KIND: &'static str = "document";
    type Patch = Infallible;

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant_id(&self) -> Option<Uuid> {
        Some(self.tenant_id)
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn apply(&mut self, patch: Infallible) {
        match patch {}
    }
}
