// handlers/elevated/tenants.rs - /api/tenants and /api/tenants/:id

use axum::{extract::State, http::HeaderMap};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::Role;
use crate::database::{Tenant, TenantPatch};
use crate::error::ApiError;
use crate::handlers::utils::{
    require, store_error, validate_company_code, within_scope, ApiJson, ApiPath, Validator,
};
use crate::middleware::{ApiResponse, ApiResult};

const PLATFORM: &[Role] = &[Role::SuperAdmin];

const CODE_TAKEN: &str = "Company code already exists";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenantRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    pub is_active: Option<bool>,
}

/// GET /api/tenants
pub async fn list(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Vec<Tenant>> {
    let (_, scope) = require(&state, &headers, PLATFORM)?;
    let tenants = state.store.tenants.get_all(scope.tenant_id()).await?;
    Ok(ApiResponse::success(tenants))
}

/// POST /api/tenants - Register a company
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<ApiJson<CreateTenantRequest>, ApiError>,
) -> ApiResult<Tenant> {
    let (session, _) = require(&state, &headers, PLATFORM)?;
    let ApiJson(body) = body?;

    let mut v = Validator::new();
    let name = v.required("name", &body.name);
    let code = v.required("code", &body.code);
    if !code.is_empty() {
        v.check_result("code", validate_company_code(&code));
    }
    v.finish()?;

    let mut tenant = Tenant::new(name, code);
    if let Some(is_active) = body.is_active {
        tenant.is_active = is_active;
    }

    let created = state
        .store
        .tenants
        .create(tenant)
        .await
        .map_err(|e| store_error(e, CODE_TAKEN))?;

    tracing::info!(actor = %session.user_id, tenant_id = %created.id, code = %created.code, "tenant created");
    Ok(ApiResponse::created(created))
}

/// GET /api/tenants/:id
pub async fn get(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<ApiPath<Uuid>, ApiError>,
) -> ApiResult<Tenant> {
    let (_, scope) = require(&state, &headers, PLATFORM)?;
    let ApiPath(id) = id?;
    let tenant = within_scope(state.store.tenants.get_by_id(id).await?, &scope, "Tenant")?;
    Ok(ApiResponse::success(tenant))
}

/// PATCH /api/tenants/:id - Deactivating a tenant blocks its users from signing in
pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<ApiPath<Uuid>, ApiError>,
    body: Result<ApiJson<TenantPatch>, ApiError>,
) -> ApiResult<Tenant> {
    let (_, scope) = require(&state, &headers, PLATFORM)?;
    let ApiPath(id) = id?;
    let ApiJson(mut body) = body?;

    let mut v = Validator::new();
    body.name = v.not_blank("name", body.name);
    body.code = v.not_blank("code", body.code);
    if let Some(code) = body.code.as_deref().filter(|c| !c.is_empty()) {
        v.check_result("code", validate_company_code(code));
    }
    v.finish()?;

    let updated = state
        .store
        .tenants
        .update(id, body, scope.tenant_id())
        .await
        .map_err(|e| store_error(e, CODE_TAKEN))?
        .ok_or_else(|| ApiError::not_found("Tenant not found"))?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/tenants/:id
pub async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<ApiPath<Uuid>, ApiError>,
) -> ApiResult<()> {
    let (session, scope) = require(&state, &headers, PLATFORM)?;
    let ApiPath(id) = id?;
    if !state.store.tenants.delete(id, scope.tenant_id()).await? {
        return Err(ApiError::not_found("Tenant not found"));
    }
    tracing::info!(actor = %session.user_id, tenant_id = %id, "tenant deleted");
    Ok(ApiResponse::no_content())
}
