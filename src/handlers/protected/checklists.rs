// handlers/protected/checklists.rs - /api/checklists/templates and /api/checklists/submissions

use axum::{extract::State, http::HeaderMap};
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::Role;
use crate::database::{
    ChecklistItem, ChecklistResponse, ChecklistSubmission, ChecklistTemplate, SubmissionStatus,
    TemplatePatch,
};
use crate::error::ApiError;
use crate::handlers::utils::{
    creation_tenant, require, within_scope, ApiJson, ApiPath, ApiQuery, Validator,
};
use crate::middleware::{ApiResponse, ApiResult};

const TEMPLATE_READERS: &[Role] = &Role::TENANT_ROLES;
const TEMPLATE_AUTHORS: &[Role] = &[Role::QualityTech, Role::Engineer, Role::Admin, Role::Owner];
const SUBMISSION_REVIEWERS: &[Role] = &[
    Role::QualityTech,
    Role::Engineer,
    Role::LabTech,
    Role::Admin,
    Role::Owner,
];
const SUBMITTERS: &[Role] = &[
    Role::Worker,
    Role::QualityTech,
    Role::Engineer,
    Role::LabTech,
    Role::Admin,
    Role::Owner,
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub department: Option<String>,
    #[serde(default)]
    pub items: Vec<ChecklistItem>,
    pub tenant_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmissionRequest {
    pub template_id: Uuid,
    #[serde(default)]
    pub responses: Vec<ChecklistResponse>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionQuery {
    pub template_id: Option<Uuid>,
    pub status: Option<SubmissionStatus>,
}

/// Trim labels and reject blank or repeated ones.
fn check_items(v: &mut Validator, items: &mut [ChecklistItem]) {
    let mut seen = HashMap::new();
    for item in items.iter_mut() {
        item.label = item.label.trim().to_string();
        v.check(!item.label.is_empty(), "items", "every item needs a label");
        if !item.label.is_empty() {
            let count = seen.entry(item.label.to_lowercase()).or_insert(0);
            *count += 1;
            v.check(*count == 1, "items", "item labels must be unique");
        }
    }
}

/// GET /api/checklists/templates
pub async fn list_templates(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Vec<ChecklistTemplate>> {
    let (_, scope) = require(&state, &headers, TEMPLATE_READERS)?;
    let templates = state.store.templates.get_all(scope.tenant_id()).await?;
    Ok(ApiResponse::success(templates))
}

/// POST /api/checklists/templates
pub async fn create_template(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<ApiJson<CreateTemplateRequest>, ApiError>,
) -> ApiResult<ChecklistTemplate> {
    let (session, _) = require(&state, &headers, TEMPLATE_AUTHORS)?;
    let ApiJson(mut body) = body?;

    let mut v = Validator::new();
    let name = v.required("name", &body.name);
    v.check(!body.items.is_empty(), "items", "at least one item is required");
    check_items(&mut v, &mut body.items);
    let description = v.optional(body.description);
    let department = v.optional(body.department);
    v.finish()?;

    let tenant_id = creation_tenant(&state, &session, body.tenant_id).await?;
    let template = ChecklistTemplate::new(
        tenant_id,
        session.user_id,
        name,
        description,
        department,
        body.items,
    );
    let created = state.store.templates.create(template).await?;
    Ok(ApiResponse::created(created))
}

/// GET /api/checklists/templates/:id
pub async fn get_template(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<ApiPath<Uuid>, ApiError>,
) -> ApiResult<ChecklistTemplate> {
    let (_, scope) = require(&state, &headers, TEMPLATE_READERS)?;
    let ApiPath(id) = id?;
    let template = within_scope(
        state.store.templates.get_by_id(id).await?,
        &scope,
        "Checklist template",
    )?;
    Ok(ApiResponse::success(template))
}

/// PATCH /api/checklists/templates/:id
pub async fn update_template(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<ApiPath<Uuid>, ApiError>,
    body: Result<ApiJson<TemplatePatch>, ApiError>,
) -> ApiResult<ChecklistTemplate> {
    let (_, scope) = require(&state, &headers, TEMPLATE_AUTHORS)?;
    let ApiPath(id) = id?;
    let ApiJson(mut body) = body?;

    let mut v = Validator::new();
    body.name = v.not_blank("name", body.name);
    if let Some(items) = body.items.as_mut() {
        v.check(!items.is_empty(), "items", "at least one item is required");
        check_items(&mut v, items);
    }
    v.finish()?;

    let updated = state
        .store
        .templates
        .update(id, body, scope.tenant_id())
        .await?
        .ok_or_else(|| ApiError::not_found("Checklist template not found"))?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/checklists/templates/:id
pub async fn delete_template(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<ApiPath<Uuid>, ApiError>,
) -> ApiResult<()> {
    let (_, scope) = require(&state, &headers, TEMPLATE_AUTHORS)?;
    let ApiPath(id) = id?;
    if !state.store.templates.delete(id, scope.tenant_id()).await? {
        return Err(ApiError::not_found("Checklist template not found"));
    }
    Ok(ApiResponse::no_content())
}

/// GET /api/checklists/submissions - Optional `templateId` and `status` filters
pub async fn list_submissions(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<ApiQuery<SubmissionQuery>, ApiError>,
) -> ApiResult<Vec<ChecklistSubmission>> {
    let (_, scope) = require(&state, &headers, SUBMISSION_REVIEWERS)?;
    let ApiQuery(query) = query?;
    let submissions = state
        .store
        .submissions
        .get_all(scope.tenant_id())
        .await?
        .into_iter()
        .filter(|s| query.template_id.map_or(true, |t| s.template_id == t))
        .filter(|s| query.status.map_or(true, |status| s.status == status))
        .collect();
    Ok(ApiResponse::success(submissions))
}

/// POST /api/checklists/submissions - Record a filled-in checklist
///
/// The submission lands in the template's tenant. Any failed response flags it.
pub async fn create_submission(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<ApiJson<CreateSubmissionRequest>, ApiError>,
) -> ApiResult<ChecklistSubmission> {
    let (session, scope) = require(&state, &headers, SUBMITTERS)?;
    let ApiJson(mut body) = body?;

    let template = state
        .store
        .templates
        .get_by_id(body.template_id)
        .await?
        .filter(|t| scope.permits(Some(t.tenant_id)))
        .ok_or_else(|| {
            ApiError::validation_error(
                "Unknown checklist template",
                Some(HashMap::from([(
                    "templateId".to_string(),
                    "does not name a template in your company".to_string(),
                )])),
            )
        })?;

    let mut v = Validator::new();
    for response in body.responses.iter_mut() {
        response.label = response.label.trim().to_string();
        v.check(!response.label.is_empty(), "responses", "every response needs a label");
    }
    let missing = template.missing_required(&body.responses);
    v.check(
        missing.is_empty(),
        "responses",
        &format!("missing required items: {}", missing.join(", ")),
    );
    let notes = v.optional(body.notes);
    v.finish()?;

    let submission = ChecklistSubmission::new(
        &template,
        session.user_id,
        session.username.clone(),
        body.responses,
        notes,
    );
    let created = state.store.submissions.create(submission).await?;

    if created.status == SubmissionStatus::Flagged {
        tracing::info!(
            submission_id = %created.id,
            template_id = %template.id,
            "checklist submission flagged"
        );
    }
    Ok(ApiResponse::created(created))
}

/// GET /api/checklists/submissions/:id
pub async fn get_submission(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<ApiPath<Uuid>, ApiError>,
) -> ApiResult<ChecklistSubmission> {
    let (_, scope) = require(&state, &headers, SUBMISSION_REVIEWERS)?;
    let ApiPath(id) = id?;
    let submission = within_scope(
        state.store.submissions.get_by_id(id).await?,
        &scope,
        "Checklist submission",
    )?;
    Ok(ApiResponse::success(submission))
}
