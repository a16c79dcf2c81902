//! Per-handler authorization.
//!
//! [`authorize`] answers one question: does the request carry a valid session
//! whose role is allowed here? It does not look at tenants. Handlers follow
//! every `Allowed` with [`tenant_scope`] (and, for single resources,
//! [`TenantScope::permits`]) before touching storage.

use axum::http::HeaderMap;
use uuid::Uuid;

use super::role::Role;
use super::session::{SessionPayload, Sessions};
use crate::error::ApiError;

/// Outcome of an authorization check. Branch on the tag before using the payload.
#[derive(Debug)]
pub enum AuthResult {
    Allowed { payload: SessionPayload },
    Denied { response: ApiError },
}

impl AuthResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AuthResult::Allowed { .. })
    }

    pub fn into_result(self) -> Result<SessionPayload, ApiError> {
        match self {
            AuthResult::Allowed { payload } => Ok(payload),
            AuthResult::Denied { response } => Err(response),
        }
    }
}

/// Resolve the session from the request cookies and check its role.
///
/// - no session cookie, or a token that fails verification: 401
/// - `super_admin`: allowed whatever `allowed` contains, even when empty
/// - role outside `allowed`: 403
pub fn authorize(headers: &HeaderMap, sessions: &Sessions, allowed: &[Role]) -> AuthResult {
    let Some(token) = sessions.token_from(headers) else {
        return AuthResult::Denied {
            response: ApiError::unauthorized("Authentication required"),
        };
    };

    let Some(payload) = sessions.codec.verify(&token) else {
        return AuthResult::Denied {
            response: ApiError::unauthorized("Session is invalid or expired"),
        };
    };

    if payload.role.is_super_admin() {
        return AuthResult::Allowed { payload };
    }

    if !allowed.contains(&payload.role) {
        tracing::warn!(
            user_id = %payload.user_id,
            role = %payload.role,
            "role not permitted for this action"
        );
        return AuthResult::Denied {
            response: ApiError::forbidden("Insufficient permissions"),
        };
    }

    AuthResult::Allowed { payload }
}

/// Which tenants' rows a session may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantScope {
    All,
    Tenant(Uuid),
}

impl TenantScope {
    /// Storage filter: `None` means unfiltered.
    pub fn tenant_id(&self) -> Option<Uuid> {
        match self {
            TenantScope::All => None,
            TenantScope::Tenant(id) => Some(*id),
        }
    }

    pub fn permits(&self, resource_tenant: Option<Uuid>) -> bool {
        match self {
            TenantScope::All => true,
            TenantScope::Tenant(id) => resource_tenant == Some(*id),
        }
    }
}

/// `super_admin` spans every tenant; everyone else is pinned to their own.
pub fn tenant_scope(payload: &SessionPayload) -> Result<TenantScope, ApiError> {
    if payload.role.is_super_admin() {
        return Ok(TenantScope::All);
    }
    match payload.tenant_id {
        Some(id) => Ok(TenantScope::Tenant(id)),
        None => {
            tracing::warn!(user_id = %payload.user_id, "tenant role without a tenant");
            Err(ApiError::forbidden("No tenant assigned to this account"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{cookie_headers, test_sessions};
    use axum::http::StatusCode;

    fn session(role: Role) -> SessionPayload {
        SessionPayload {
            user_id: Uuid::new_v4(),
            tenant_id: Some(Uuid::new_v4()),
            role,
            username: "tester".to_string(),
        }
    }

    fn denied_status(result: AuthResult) -> StatusCode {
        match result {
            AuthResult::Denied { response } => response.status_code(),
            AuthResult::Allowed { .. } => panic!("expected denial"),
        }
    }

    #[test]
    fn missing_cookie_is_401() {
        let sessions = test_sessions();
        let result = authorize(&HeaderMap::new(), &sessions, &Role::ALL);
        assert_eq!(denied_status(result), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn invalid_token_is_401() {
        let sessions = test_sessions();
        let headers = cookie_headers(&sessions, "forged.token.value");
        let result = authorize(&headers, &sessions, &Role::ALL);
        assert_eq!(denied_status(result), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn super_admin_bypasses_every_allow_list() {
        let sessions = test_sessions();
        let token = sessions.codec.issue(&session(Role::SuperAdmin)).unwrap();
        let headers = cookie_headers(&sessions, &token);

        assert!(authorize(&headers, &sessions, &[]).is_allowed());
        assert!(authorize(&headers, &sessions, &[Role::Worker]).is_allowed());
        assert!(authorize(&headers, &sessions, &Role::TENANT_ROLES).is_allowed());
    }

    #[test]
    fn role_outside_allow_list_is_403() {
        let sessions = test_sessions();
        for role in Role::TENANT_ROLES {
            let token = sessions.codec.issue(&session(role)).unwrap();
            let headers = cookie_headers(&sessions, &token);
            let others: Vec<Role> = Role::TENANT_ROLES
                .iter()
                .copied()
                .filter(|r| *r != role)
                .collect();
            assert_eq!(
                denied_status(authorize(&headers, &sessions, &others)),
                StatusCode::FORBIDDEN,
                "{} should be refused",
                role
            );
            assert_eq!(
                denied_status(authorize(&headers, &sessions, &[])),
                StatusCode::FORBIDDEN
            );
        }
    }

    #[test]
    fn allowed_role_returns_payload() {
        let sessions = test_sessions();
        let expected = session(Role::Shipping);
        let token = sessions.codec.issue(&expected).unwrap();
        let headers = cookie_headers(&sessions, &token);
        let payload = authorize(&headers, &sessions, &[Role::Shipping, Role::Admin])
            .into_result()
            .unwrap();
        assert_eq!(payload, expected);
    }

    #[test]
    fn scope_pins_tenant_roles() {
        let worker = session(Role::Worker);
        let tenant = worker.tenant_id.unwrap();
        let scope = tenant_scope(&worker).unwrap();
        assert_eq!(scope, TenantScope::Tenant(tenant));
        assert!(scope.permits(Some(tenant)));
        assert!(!scope.permits(Some(Uuid::new_v4())));
        assert!(!scope.permits(None));

        let admin = SessionPayload {
            tenant_id: None,
            ..session(Role::SuperAdmin)
        };
        assert_eq!(tenant_scope(&admin).unwrap(), TenantScope::All);
    }

    #[test]
    fn tenant_role_without_tenant_is_refused() {
        let orphan = SessionPayload {
            tenant_id: None,
            ..session(Role::Admin)
        };
        let err = tenant_scope(&orphan).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }
}
