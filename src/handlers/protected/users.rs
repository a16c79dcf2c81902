// handlers/protected/users.rs - /api/users and /api/users/:id

use axum::{extract::State, http::HeaderMap};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::{hash_password, meets_minimum_length, Role};
use crate::database::{PublicUser, User, UserPatch};
use crate::error::ApiError;
use crate::handlers::utils::{
    creation_tenant, require, store_error, validate_username_format, within_scope, ApiJson,
    ApiPath, Validator,
};
use crate::middleware::{ApiResponse, ApiResult};

const USER_ADMINS: &[Role] = &[Role::Admin, Role::Owner];

const USERNAME_TAKEN: &str = "Username already exists";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub role: Role,
    pub display_name: Option<String>,
    pub tenant_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub display_name: Option<String>,
    pub is_active: Option<bool>,
}

/// Only super_admin grants super_admin; only owner or super_admin grants owner.
fn ensure_can_grant(actor: Role, role: Role) -> Result<(), ApiError> {
    match role {
        Role::SuperAdmin if !actor.is_super_admin() => {
            Err(ApiError::forbidden("Only a super admin can grant super_admin"))
        }
        Role::Owner if !matches!(actor, Role::Owner | Role::SuperAdmin) => {
            Err(ApiError::forbidden("Only an owner can grant owner"))
        }
        _ => Ok(()),
    }
}

async fn hash(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| {
            tracing::error!("password hashing task failed: {}", e);
            ApiError::internal_server_error("An error occurred while processing your request")
        })?
        .map_err(|e| {
            tracing::error!("{}", e);
            ApiError::internal_server_error("An error occurred while processing your request")
        })
}

/// GET /api/users - Users in the caller's tenant (all users for super_admin)
pub async fn list(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Vec<PublicUser>> {
    let (_, scope) = require(&state, &headers, USER_ADMINS)?;
    let users = state.store.users.get_all(scope.tenant_id()).await?;
    Ok(ApiResponse::success(
        users.into_iter().map(PublicUser::from).collect(),
    ))
}

/// POST /api/users - Create an account
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<ApiJson<CreateUserRequest>, ApiError>,
) -> ApiResult<PublicUser> {
    let (session, _) = require(&state, &headers, USER_ADMINS)?;
    let ApiJson(body) = body?;
    ensure_can_grant(session.role, body.role)?;

    let mut v = Validator::new();
    let username = v.required("username", &body.username);
    if !username.is_empty() {
        v.check_result("username", validate_username_format(&username));
    }
    v.check(
        meets_minimum_length(&body.password),
        "password",
        "must be at least 8 characters",
    );
    let display_name = v.optional(body.display_name);
    v.finish()?;

    // super_admin accounts are platform principals and never belong to a tenant.
    let tenant_id = if body.role.is_super_admin() {
        None
    } else {
        Some(creation_tenant(&state, &session, body.tenant_id).await?)
    };

    let password_hash = hash(body.password).await?;
    let user = User::new(tenant_id, username, password_hash, body.role, display_name);
    let created = state
        .store
        .users
        .create(user)
        .await
        .map_err(|e| store_error(e, USERNAME_TAKEN))?;

    tracing::info!(
        actor = %session.user_id,
        user_id = %created.id,
        role = %created.role,
        "user created"
    );
    Ok(ApiResponse::created(created.into()))
}

/// GET /api/users/:id
pub async fn get(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<ApiPath<Uuid>, ApiError>,
) -> ApiResult<PublicUser> {
    let (_, scope) = require(&state, &headers, USER_ADMINS)?;
    let ApiPath(id) = id?;
    let user = within_scope(state.store.users.get_by_id(id).await?, &scope, "User")?;
    Ok(ApiResponse::success(user.into()))
}

/// PATCH /api/users/:id
pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<ApiPath<Uuid>, ApiError>,
    body: Result<ApiJson<UpdateUserRequest>, ApiError>,
) -> ApiResult<PublicUser> {
    let (session, scope) = require(&state, &headers, USER_ADMINS)?;
    let ApiPath(id) = id?;
    let ApiJson(body) = body?;
    let target = within_scope(state.store.users.get_by_id(id).await?, &scope, "User")?;

    // Touching an owner or super_admin needs the same rank as granting it.
    ensure_can_grant(session.role, target.role)?;
    if let Some(role) = body.role {
        ensure_can_grant(session.role, role)?;
        if role.is_super_admin() != target.tenant_id.is_none() {
            return Err(ApiError::bad_request(
                "super_admin is reserved for accounts without a tenant",
            ));
        }
    }

    let mut v = Validator::new();
    let username = v.not_blank("username", body.username);
    if let Some(name) = username.as_deref().filter(|n| !n.is_empty()) {
        v.check_result("username", validate_username_format(name));
    }
    if let Some(password) = &body.password {
        v.check(
            meets_minimum_length(password),
            "password",
            "must be at least 8 characters",
        );
    }
    let display_name = v.optional(body.display_name);
    v.finish()?;

    if id == session.user_id && body.is_active == Some(false) {
        return Err(ApiError::bad_request("You cannot deactivate your own account"));
    }

    let password_hash = match body.password {
        Some(password) => Some(hash(password).await?),
        None => None,
    };

    let patch = UserPatch {
        username,
        password_hash,
        role: body.role,
        display_name,
        is_active: body.is_active,
    };

    let updated = state
        .store
        .users
        .update(id, patch, scope.tenant_id())
        .await
        .map_err(|e| store_error(e, USERNAME_TAKEN))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(ApiResponse::success(updated.into()))
}

/// DELETE /api/users/:id
pub async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<ApiPath<Uuid>, ApiError>,
) -> ApiResult<()> {
    let (session, scope) = require(&state, &headers, USER_ADMINS)?;
    let ApiPath(id) = id?;
    if id == session.user_id {
        return Err(ApiError::bad_request("You cannot delete your own account"));
    }

    let target = within_scope(state.store.users.get_by_id(id).await?, &scope, "User")?;
    ensure_can_grant(session.role, target.role)?;

    if !state.store.users.delete(id, scope.tenant_id()).await? {
        return Err(ApiError::not_found("User not found"));
    }

    tracing::info!(actor = %session.user_id, user_id = %id, "user deleted");
    Ok(ApiResponse::no_content())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_rules() {
        assert!(ensure_can_grant(Role::Admin, Role::Worker).is_ok());
        assert!(ensure_can_grant(Role::Admin, Role::Admin).is_ok());
        assert!(ensure_can_grant(Role::Admin, Role::Owner).is_err());
        assert!(ensure_can_grant(Role::Owner, Role::Owner).is_ok());
        assert!(ensure_can_grant(Role::Owner, Role::SuperAdmin).is_err());
        assert!(ensure_can_grant(Role::SuperAdmin, Role::SuperAdmin).is_ok());
        assert!(ensure_can_grant(Role::SuperAdmin, Role::Owner).is_ok());
    }
}
