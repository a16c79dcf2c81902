// handlers/protected/messages.rs - /api/messages/groups and group messages
//
// Anyone in the tenant may read the group list, but only sees groups they
// belong to unless they manage the tenant. Reading or posting messages
// requires membership under the same rule.

use axum::{extract::State, http::HeaderMap};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::{Role, SessionPayload, TenantScope};
use crate::database::{Message, MessageGroup};
use crate::error::ApiError;
use crate::handlers::utils::{
    creation_tenant, require, within_scope, ApiJson, ApiPath, Validator,
};
use crate::middleware::{ApiResponse, ApiResult};

const MEMBERS: &[Role] = &Role::TENANT_ROLES;
const GROUP_CREATORS: &[Role] = &[Role::Engineer, Role::QualityTech, Role::Admin, Role::Owner];
const MANAGERS: &[Role] = &[Role::Admin, Role::Owner];

const MAX_MESSAGE_LENGTH: usize = 4000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub member_ids: Vec<Uuid>,
    pub tenant_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    #[serde(default)]
    pub body: String,
}

fn can_read(session: &SessionPayload, group: &MessageGroup) -> bool {
    session.role.is_tenant_manager() || group.is_member(session.user_id)
}

/// Group the caller may open, 404 outside the tenant, 403 for non-members.
async fn open_group(
    state: &AppState,
    session: &SessionPayload,
    scope: &TenantScope,
    id: Uuid,
) -> Result<MessageGroup, ApiError> {
    let group = within_scope(state.store.message_groups.get_by_id(id).await?, scope, "Group")?;
    if !can_read(session, &group) {
        return Err(ApiError::forbidden("You are not a member of this group"));
    }
    Ok(group)
}

/// GET /api/messages/groups
pub async fn list_groups(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Vec<MessageGroup>> {
    let (session, scope) = require(&state, &headers, MEMBERS)?;
    let groups = state
        .store
        .message_groups
        .get_all(scope.tenant_id())
        .await?
        .into_iter()
        .filter(|g| can_read(&session, g))
        .collect();
    Ok(ApiResponse::success(groups))
}

/// POST /api/messages/groups - The creator is always added as a member
pub async fn create_group(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<ApiJson<CreateGroupRequest>, ApiError>,
) -> ApiResult<MessageGroup> {
    let (session, _) = require(&state, &headers, GROUP_CREATORS)?;
    let ApiJson(body) = body?;

    let mut v = Validator::new();
    let name = v.required("name", &body.name);
    v.finish()?;

    let tenant_id = creation_tenant(&state, &session, body.tenant_id).await?;

    // Members must be users of the same tenant.
    let mut v = Validator::new();
    for member in &body.member_ids {
        let belongs = state
            .store
            .users
            .get_by_id(*member)
            .await?
            .is_some_and(|u| u.tenant_id == Some(tenant_id));
        v.check(belongs, "memberIds", "every member must be a user of this company");
    }
    v.finish()?;

    let group = MessageGroup::new(tenant_id, session.user_id, name, body.member_ids);
    let created = state.store.message_groups.create(group).await?;
    Ok(ApiResponse::created(created))
}

/// DELETE /api/messages/groups/:id - Removes the group and its messages
pub async fn delete_group(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<ApiPath<Uuid>, ApiError>,
) -> ApiResult<()> {
    let (_, scope) = require(&state, &headers, MANAGERS)?;
    let ApiPath(id) = id?;
    let group = within_scope(state.store.message_groups.get_by_id(id).await?, &scope, "Group")?;

    let messages = state.store.messages.get_all(Some(group.tenant_id)).await?;
    for message in messages.iter().filter(|m| m.group_id == group.id) {
        state.store.messages.delete(message.id, Some(group.tenant_id)).await?;
    }

    state.store.message_groups.delete(group.id, Some(group.tenant_id)).await?;
    Ok(ApiResponse::no_content())
}

/// GET /api/messages/groups/:id/messages - Oldest first
pub async fn list_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<ApiPath<Uuid>, ApiError>,
) -> ApiResult<Vec<Message>> {
    let (session, scope) = require(&state, &headers, MEMBERS)?;
    let ApiPath(id) = id?;
    let group = open_group(&state, &session, &scope, id).await?;

    let mut messages: Vec<Message> = state
        .store
        .messages
        .get_all(Some(group.tenant_id))
        .await?
        .into_iter()
        .filter(|m| m.group_id == group.id)
        .collect();
    messages.sort_by_key(|m| m.created_at);
    Ok(ApiResponse::success(messages))
}

/// POST /api/messages/groups/:id/messages
pub async fn post_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<ApiPath<Uuid>, ApiError>,
    body: Result<ApiJson<PostMessageRequest>, ApiError>,
) -> ApiResult<Message> {
    let (session, scope) = require(&state, &headers, MEMBERS)?;
    let ApiPath(id) = id?;
    let ApiJson(body) = body?;
    let group = open_group(&state, &session, &scope, id).await?;

    let mut v = Validator::new();
    let text = v.required("body", &body.body);
    v.check(
        text.chars().count() <= MAX_MESSAGE_LENGTH,
        "body",
        "must be at most 4000 characters",
    );
    v.finish()?;

    let message = Message::new(&group, session.user_id, session.username.clone(), text);
    let created = state.store.messages.create(message).await?;
    Ok(ApiResponse::created(created))
}
