// handlers/protected/auth.rs - GET /api/auth/me

use axum::{extract::State, http::HeaderMap};
use serde::Serialize;

use crate::app::AppState;
use crate::auth::{Role, SessionPayload};
use crate::database::PublicUser;
use crate::error::ApiError;
use crate::handlers::utils::require;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub session: SessionPayload,
    pub user: PublicUser,
    pub landing_page: String,
}

/// GET /api/auth/me - The signed-in user and where their home page is
///
/// This is the one endpoint that loads the stored account behind the token.
/// Resource handlers trust the signed claims until the token expires, so a
/// deactivated user keeps API access for the rest of the session but is told
/// here (and by the client shell that calls `me` on load) that it has ended.
pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<MeResponse> {
    let (session, _) = require(&state, &headers, &Role::TENANT_ROLES)?;

    let user = match state.store.users.get_by_id(session.user_id).await? {
        Some(user) if user.is_active => user,
        _ => return Err(ApiError::unauthorized("Session is invalid or expired")),
    };

    let landing_page = state.routes.landing_for(session.role).to_string();
    Ok(ApiResponse::success(MeResponse {
        session,
        user: user.into(),
        landing_page,
    }))
}
