// handlers/public/auth.rs - POST /api/auth/login, POST /api/auth/logout

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::app::AppState;
use crate::auth::verify_credentials;
use crate::database::{PublicUser, User};
use crate::error::ApiError;
use crate::handlers::utils::ApiJson;
use crate::middleware::ApiResponse;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// POST /api/auth/login - Verify credentials and start a session cookie
///
/// Every failure (unknown user, wrong password, disabled account, disabled
/// tenant) answers the same 401 after the same password work, so neither the
/// body nor the timing tells which one it was.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Response, ApiError> {
    let username = body.username.trim();
    if username.is_empty() || body.password.is_empty() {
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    let user = state.store.users.find_unique("username", username).await?;

    // Unknown usernames go through the same Argon2 work as wrong passwords.
    let password = body.password.clone();
    let hash = user.as_ref().map(|u| u.password_hash.clone());
    let verified =
        tokio::task::spawn_blocking(move || verify_credentials(&password, hash.as_deref()))
            .await
            .map_err(|e| {
                tracing::error!("password verification task failed: {}", e);
                ApiError::internal_server_error("An error occurred while processing your request")
            })?;

    let user = match user {
        Some(user) if verified => user,
        Some(user) => {
            tracing::info!(user_id = %user.id, "login refused: wrong password");
            return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
        }
        None => {
            tracing::info!(username, "login refused: unknown user");
            return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
        }
    };

    if let Err(reason) = account_usable(&state, &user).await? {
        tracing::info!(user_id = %user.id, "login refused: {}", reason);
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    let cookie = state.sessions.start(&user.session_payload()).map_err(|e| {
        tracing::error!("failed to issue session token: {}", e);
        ApiError::internal_server_error("Could not start a session")
    })?;

    tracing::info!(user_id = %user.id, role = %user.role, "login succeeded");

    Ok((
        [(header::SET_COOKIE, cookie)],
        ApiResponse::success(PublicUser::from(user)),
    )
        .into_response())
}

/// `Ok(Err(reason))` when the account exists but may not sign in.
async fn account_usable(
    state: &AppState,
    user: &User,
) -> Result<Result<(), &'static str>, ApiError> {
    if !user.is_active {
        return Ok(Err("account disabled"));
    }

    let Some(tenant_id) = user.tenant_id else {
        // Platform principals have no tenant and must be super admins.
        return Ok(if user.role.is_super_admin() {
            Ok(())
        } else {
            Err("tenant role without a tenant")
        });
    };

    Ok(match state.store.tenants.get_by_id(tenant_id).await? {
        Some(tenant) if tenant.is_active => Ok(()),
        Some(_) => Err("tenant disabled"),
        None => Err("tenant missing"),
    })
}

/// POST /api/auth/logout - Clear the session cookie
pub async fn logout(State(state): State<AppState>) -> Response {
    (
        [(header::SET_COOKIE, state.sessions.cookie.clear())],
        ApiResponse::success(json!({ "loggedOut": true })),
    )
        .into_response()
}
