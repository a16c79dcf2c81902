// handlers/protected/incidents.rs - /api/incidents and /api/incidents/:id

use axum::{extract::State, http::HeaderMap};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::Role;
use crate::database::{Incident, IncidentPatch, IncidentSeverity, IncidentStatus};
use crate::error::ApiError;
use crate::handlers::utils::{
    creation_tenant, require, within_scope, ApiJson, ApiPath, ApiQuery, Validator,
};
use crate::middleware::{ApiResponse, ApiResult};

const REPORTERS: &[Role] = &Role::TENANT_ROLES;
const INVESTIGATORS: &[Role] = &[Role::QualityTech, Role::Engineer, Role::Admin, Role::Owner];
const MANAGERS: &[Role] = &[Role::Admin, Role::Owner];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIncidentRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub severity: Option<IncidentSeverity>,
    pub location: Option<String>,
    pub tenant_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IncidentQuery {
    pub status: Option<IncidentStatus>,
    pub severity: Option<IncidentSeverity>,
}

/// GET /api/incidents - Optional `status` and `severity` filters
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<ApiQuery<IncidentQuery>, ApiError>,
) -> ApiResult<Vec<Incident>> {
    let (_, scope) = require(&state, &headers, REPORTERS)?;
    let ApiQuery(query) = query?;
    let incidents = state
        .store
        .incidents
        .get_all(scope.tenant_id())
        .await?
        .into_iter()
        .filter(|i| query.status.map_or(true, |s| i.status == s))
        .filter(|i| query.severity.map_or(true, |s| i.severity == s))
        .collect();
    Ok(ApiResponse::success(incidents))
}

/// POST /api/incidents - Report an incident (status starts at `open`)
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<ApiJson<CreateIncidentRequest>, ApiError>,
) -> ApiResult<Incident> {
    let (session, _) = require(&state, &headers, REPORTERS)?;
    let ApiJson(body) = body?;

    let mut v = Validator::new();
    let title = v.required("title", &body.title);
    let description = v.required("description", &body.description);
    let location = v.optional(body.location);
    v.finish()?;

    let tenant_id = creation_tenant(&state, &session, body.tenant_id).await?;
    let incident = Incident::new(
        tenant_id,
        session.user_id,
        title,
        description,
        body.severity.unwrap_or(IncidentSeverity::Medium),
        location,
    );
    let created = state.store.incidents.create(incident).await?;

    if created.severity == IncidentSeverity::Critical {
        tracing::warn!(incident_id = %created.id, tenant_id = %created.tenant_id, "critical incident reported");
    }
    Ok(ApiResponse::created(created))
}

/// GET /api/incidents/:id
pub async fn get(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<ApiPath<Uuid>, ApiError>,
) -> ApiResult<Incident> {
    let (_, scope) = require(&state, &headers, REPORTERS)?;
    let ApiPath(id) = id?;
    let incident = within_scope(state.store.incidents.get_by_id(id).await?, &scope, "Incident")?;
    Ok(ApiResponse::success(incident))
}

/// PATCH /api/incidents/:id
pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<ApiPath<Uuid>, ApiError>,
    body: Result<ApiJson<IncidentPatch>, ApiError>,
) -> ApiResult<Incident> {
    let (_, scope) = require(&state, &headers, INVESTIGATORS)?;
    let ApiPath(id) = id?;
    let ApiJson(mut body) = body?;

    let mut v = Validator::new();
    body.title = v.not_blank("title", body.title);
    body.description = v.not_blank("description", body.description);
    v.finish()?;

    let updated = state
        .store
        .incidents
        .update(id, body, scope.tenant_id())
        .await?
        .ok_or_else(|| ApiError::not_found("Incident not found"))?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/incidents/:id
pub async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<ApiPath<Uuid>, ApiError>,
) -> ApiResult<()> {
    let (_, scope) = require(&state, &headers, MANAGERS)?;
    let ApiPath(id) = id?;
    if !state.store.incidents.delete(id, scope.tenant_id()).await? {
        return Err(ApiError::not_found("Incident not found"));
    }
    Ok(ApiResponse::no_content())
}
