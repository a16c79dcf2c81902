// handlers/protected/documents.rs - /api/documents/folders and folder documents

use axum::{extract::State, http::HeaderMap};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::Role;
use crate::database::{Document, DocumentFolder};
use crate::error::ApiError;
use crate::handlers::utils::{
    creation_tenant, require, within_scope, ApiJson, ApiPath, Validator,
};
use crate::middleware::{ApiResponse, ApiResult};

const READERS: &[Role] = &Role::TENANT_ROLES;
const LIBRARIANS: &[Role] = &[Role::Engineer, Role::QualityTech, Role::Admin, Role::Owner];
const MANAGERS: &[Role] = &[Role::Admin, Role::Owner];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    #[serde(default)]
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

fn check_link(raw: &str) -> Result<(), String> {
    match url::Url::parse(raw) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        Ok(_) => Err("must be an http or https link".to_string()),
        Err(_) => Err("must be a valid URL".to_string()),
    }
}

/// GET /api/documents/folders
pub async fn list_folders(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Vec<DocumentFolder>> {
    let (_, scope) = require(&state, &headers, READERS)?;
    let folders = state.store.folders.get_all(scope.tenant_id()).await?;
    Ok(ApiResponse::success(folders))
}

/// POST /api/documents/folders - `parentId` must be a folder in the same company
pub async fn create_folder(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<ApiJson<CreateFolderRequest>, ApiError>,
) -> ApiResult<DocumentFolder> {
    let (session, _) = require(&state, &headers, LIBRARIANS)?;
    let ApiJson(body) = body?;

    let mut v = Validator::new();
    let name = v.required("name", &body.name);
    v.finish()?;

    let tenant_id = creation_tenant(&state, &session, body.tenant_id).await?;

    if let Some(parent_id) = body.parent_id {
        let parent_ok = state
            .store
            .folders
            .get_by_id(parent_id)
            .await?
            .is_some_and(|parent| parent.tenant_id == tenant_id);
        let mut v = Validator::new();
        v.check(parent_ok, "parentId", "does not name a folder in this company");
        v.finish()?;
    }

    let folder = DocumentFolder::new(tenant_id, session.user_id, name, body.parent_id);
    let created = state.store.folders.create(folder).await?;
    Ok(ApiResponse::created(created))
}

/// DELETE /api/documents/folders/:id - Only empty folders can be removed
pub async fn delete_folder(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<ApiPath<Uuid>, ApiError>,
) -> ApiResult<()> {
    let (_, scope) = require(&state, &headers, MANAGERS)?;
    let ApiPath(id) = id?;
    let folder = within_scope(state.store.folders.get_by_id(id).await?, &scope, "Folder")?;

    let tenant = Some(folder.tenant_id);
    let has_children = state
        .store
        .folders
        .get_all(tenant)
        .await?
        .iter()
        .any(|f| f.parent_id == Some(folder.id));
    let has_documents = state
        .store
        .documents
        .get_all(tenant)
        .await?
        .iter()
        .any(|d| d.folder_id == folder.id);
    if has_children || has_documents {
        return Err(ApiError::conflict("Folder is not empty"));
    }

    state.store.folders.delete(folder.id, tenant).await?;
    Ok(ApiResponse::no_content())
}

/// GET /api/documents/folders/:id/documents
pub async fn list_documents(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<ApiPath<Uuid>, ApiError>,
) -> ApiResult<Vec<Document>> {
    let (_, scope) = require(&state, &headers, READERS)?;
    let ApiPath(id) = id?;
    let folder = within_scope(state.store.folders.get_by_id(id).await?, &scope, "Folder")?;
    let documents = state
        .store
        .documents
        .get_all(Some(folder.tenant_id))
        .await?
        .into_iter()
        .filter(|d| d.folder_id == folder.id)
        .collect();
    Ok(ApiResponse::success(documents))
}

/// POST /api/documents/folders/:id/documents
pub async fn create_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<ApiPath<Uuid>, ApiError>,
    body: Result<ApiJson<CreateDocumentRequest>, ApiError>,
) -> ApiResult<Document> {
    let (session, scope) = require(&state, &headers, LIBRARIANS)?;
    let ApiPath(id) = id?;
    let ApiJson(body) = body?;
    let folder = within_scope(state.store.folders.get_by_id(id).await?, &scope, "Folder")?;

    let mut v = Validator::new();
    let title = v.required("title", &body.title);
    let url = v.required("url", &body.url);
    if !url.is_empty() {
        v.check_result("url", check_link(&url));
    }
    v.finish()?;

    let document = Document::new(&folder, session.user_id, title, url);
    let created = state.store.documents.create(document).await?;
    Ok(ApiResponse::created(created))
}

/// DELETE /api/documents/:id
pub async fn delete_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<ApiPath<Uuid>, ApiError>,
) -> ApiResult<()> {
    let (_, scope) = require(&state, &headers, LIBRARIANS)?;
    let ApiPath(id) = id?;
    if !state.store.documents.delete(id, scope.tenant_id()).await? {
        return Err(ApiError::not_found("Document not found"));
    }
    Ok(ApiResponse::no_content())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_web_links_are_accepted() {
        assert!(check_link("https://docs.example.com/sop-12.pdf").is_ok());
        assert!(check_link("http://intranet/drawings/7").is_ok());
        assert!(check_link("file:///etc/passwd").is_err());
        assert!(check_link("not a link").is_err());
    }
}
