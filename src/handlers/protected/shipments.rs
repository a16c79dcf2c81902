// handlers/protected/shipments.rs - /api/shipments and /api/shipments/:id

use axum::{extract::State, http::HeaderMap};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::Role;
use crate::database::{Shipment, ShipmentDirection, ShipmentPatch, ShipmentStatus};
use crate::error::ApiError;
use crate::handlers::utils::{
    creation_tenant, require, within_scope, ApiJson, ApiPath, ApiQuery, Validator,
};
use crate::middleware::{ApiResponse, ApiResult};

const SHIPPING_DESK: &[Role] = &[Role::Shipping, Role::Admin, Role::Owner];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShipmentRequest {
    #[serde(default)]
    pub tracking_number: String,
    #[serde(default)]
    pub carrier: String,
    pub direction: ShipmentDirection,
    pub status: Option<ShipmentStatus>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub expected_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub tenant_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ShipmentQuery {
    pub status: Option<ShipmentStatus>,
    pub direction: Option<ShipmentDirection>,
}

/// GET /api/shipments - Optional `status` and `direction` filters
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<ApiQuery<ShipmentQuery>, ApiError>,
) -> ApiResult<Vec<Shipment>> {
    let (_, scope) = require(&state, &headers, SHIPPING_DESK)?;
    let ApiQuery(query) = query?;
    let shipments = state
        .store
        .shipments
        .get_all(scope.tenant_id())
        .await?
        .into_iter()
        .filter(|s| query.status.map_or(true, |status| s.status == status))
        .filter(|s| query.direction.map_or(true, |d| s.direction == d))
        .collect();
    Ok(ApiResponse::success(shipments))
}

/// POST /api/shipments
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<ApiJson<CreateShipmentRequest>, ApiError>,
) -> ApiResult<Shipment> {
    let (session, _) = require(&state, &headers, SHIPPING_DESK)?;
    let ApiJson(body) = body?;

    let mut v = Validator::new();
    let tracking_number = v.required("trackingNumber", &body.tracking_number);
    let carrier = v.required("carrier", &body.carrier);
    let origin = v.optional(body.origin);
    let destination = v.optional(body.destination);
    let notes = v.optional(body.notes);
    v.finish()?;

    let tenant_id = creation_tenant(&state, &session, body.tenant_id).await?;
    let mut shipment = Shipment::new(tenant_id, tracking_number, carrier, body.direction);
    if let Some(status) = body.status {
        shipment.status = status;
    }
    shipment.origin = origin;
    shipment.destination = destination;
    shipment.expected_at = body.expected_at;
    shipment.notes = notes;

    let created = state.store.shipments.create(shipment).await?;
    Ok(ApiResponse::created(created))
}

/// GET /api/shipments/:id
pub async fn get(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<ApiPath<Uuid>, ApiError>,
) -> ApiResult<Shipment> {
    let (_, scope) = require(&state, &headers, SHIPPING_DESK)?;
    let ApiPath(id) = id?;
    let shipment = within_scope(state.store.shipments.get_by_id(id).await?, &scope, "Shipment")?;
    Ok(ApiResponse::success(shipment))
}

/// PATCH /api/shipments/:id
pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<ApiPath<Uuid>, ApiError>,
    body: Result<ApiJson<ShipmentPatch>, ApiError>,
) -> ApiResult<Shipment> {
    let (_, scope) = require(&state, &headers, SHIPPING_DESK)?;
    let ApiPath(id) = id?;
    let ApiJson(mut body) = body?;

    let mut v = Validator::new();
    body.tracking_number = v.not_blank("trackingNumber", body.tracking_number);
    body.carrier = v.not_blank("carrier", body.carrier);
    v.finish()?;

    let updated = state
        .store
        .shipments
        .update(id, body, scope.tenant_id())
        .await?
        .ok_or_else(|| ApiError::not_found("Shipment not found"))?;

    if updated.status == ShipmentStatus::Exception {
        tracing::warn!(shipment_id = %updated.id, "shipment marked as exception");
    }
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/shipments/:id
pub async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<ApiPath<Uuid>, ApiError>,
) -> ApiResult<()> {
    let (_, scope) = require(&state, &headers, SHIPPING_DESK)?;
    let ApiPath(id) = id?;
    if !state.store.shipments.delete(id, scope.tenant_id()).await? {
        return Err(ApiError::not_found("Shipment not found"));
    }
    Ok(ApiResponse::no_content())
}
