// handlers/utils.rs - Shared request plumbing for every handler tier

use axum::{
    extract::{FromRequest, FromRequestParts},
    http::HeaderMap,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::{authorize, tenant_scope, Role, SessionPayload, TenantScope};
use crate::database::{Entity, StoreError};
use crate::error::ApiError;

/// JSON body extractor whose rejections use the API error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameters with enveloped rejections.
///
/// Handlers take `Result<ApiPath<T>, ApiError>` and unwrap it after
/// [`require`], so anonymous callers see 401 before any parse error.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Query string with enveloped rejections. Unwrapped after [`require`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Run the authorization guard and resolve the caller's tenant scope.
pub fn require(
    state: &AppState,
    headers: &HeaderMap,
    allowed: &[Role],
) -> Result<(SessionPayload, TenantScope), ApiError> {
    let payload = authorize(headers, &state.sessions, allowed).into_result()?;
    let scope = tenant_scope(&payload)?;
    Ok((payload, scope))
}

/// Tenant that a new record belongs to.
///
/// Tenant roles always write into their own tenant and `requested` is
/// ignored. `super_admin` has no tenant of its own and must name an existing
/// one.
pub async fn creation_tenant(
    state: &AppState,
    payload: &SessionPayload,
    requested: Option<Uuid>,
) -> Result<Uuid, ApiError> {
    if !payload.role.is_super_admin() {
        return payload
            .tenant_id
            .ok_or_else(|| ApiError::forbidden("No tenant assigned to this account"));
    }

    let tenant_id = requested.ok_or_else(|| {
        ApiError::validation_error("tenantId is required", Some(field("tenantId", "is required")))
    })?;

    match state.store.tenants.get_by_id(tenant_id).await? {
        Some(_) => Ok(tenant_id),
        None => Err(ApiError::validation_error(
            "Unknown tenant",
            Some(field("tenantId", "does not name an existing tenant")),
        )),
    }
}

/// A row the caller may see, or 404. Rows of other tenants do not exist
/// from the caller's point of view.
pub fn within_scope<E: Entity>(
    found: Option<E>,
    scope: &TenantScope,
    what: &str,
) -> Result<E, ApiError> {
    match found {
        Some(entity) if scope.permits(entity.tenant_id()) => Ok(entity),
        _ => Err(ApiError::not_found(format!("{} not found", what))),
    }
}

/// Map a storage error, replacing the generic conflict text.
pub fn store_error(err: StoreError, conflict_message: &str) -> ApiError {
    match err {
        StoreError::Conflict(_) => ApiError::conflict(conflict_message),
        other => other.into(),
    }
}

fn field(name: &str, message: &str) -> HashMap<String, String> {
    HashMap::from([(name.to_string(), message.to_string())])
}

/// Collects field errors for one request body.
#[derive(Debug, Default)]
pub struct Validator {
    errors: HashMap<String, String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trimmed value; records an error when blank.
    pub fn required(&mut self, name: &str, value: &str) -> String {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.reject(name, "is required");
        }
        trimmed.to_string()
    }

    /// Trimmed value, or `None` when absent or blank.
    pub fn optional(&mut self, value: Option<String>) -> Option<String> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Like [`Validator::required`] for fields a PATCH may omit.
    pub fn not_blank(&mut self, name: &str, value: Option<String>) -> Option<String> {
        value.map(|v| self.required(name, &v))
    }

    pub fn check(&mut self, ok: bool, name: &str, message: &str) {
        if !ok {
            self.reject(name, message);
        }
    }

    pub fn check_result(&mut self, name: &str, result: Result<(), String>) {
        if let Err(message) = result {
            self.reject(name, &message);
        }
    }

    fn reject(&mut self, name: &str, message: &str) {
        self.errors
            .entry(name.to_string())
            .or_insert_with(|| message.to_string());
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            return Ok(());
        }
        let mut names: Vec<&String> = self.errors.keys().collect();
        names.sort();
        let summary = names
            .iter()
            .map(|name| format!("{} {}", name, self.errors[*name]))
            .collect::<Vec<_>>()
            .join(", ");
        Err(ApiError::validation_error(
            format!("Validation failed: {}", summary),
            Some(self.errors),
        ))
    }
}

/// Username rules: 3 to 50 characters of letters, digits, `_`, `-` or `.`,
/// starting with a letter or digit.
pub fn validate_username_format(username: &str) -> Result<(), String> {
    if username.len() < 3 {
        return Err("must be at least 3 characters".to_string());
    }
    if username.len() > 50 {
        return Err("must be at most 50 characters".to_string());
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err("may only contain letters, numbers, '_', '-' and '.'".to_string());
    }
    if !username.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        return Err("must start with a letter or number".to_string());
    }
    Ok(())
}

/// Company codes: 2 to 20 letters, digits or `-`.
pub fn validate_company_code(code: &str) -> Result<(), String> {
    if code.len() < 2 || code.len() > 20 {
        return Err("must be 2 to 20 characters".to_string());
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err("may only contain letters, numbers and '-'".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert!(validate_username_format("ada.lovelace").is_ok());
        assert!(validate_username_format("op_7").is_ok());
        assert!(validate_username_format("ab").is_err());
        assert!(validate_username_format("_hidden").is_err());
        assert!(validate_username_format("has space").is_err());
    }

    #[test]
    fn company_code_rules() {
        assert!(validate_company_code("ACME-01").is_ok());
        assert!(validate_company_code("A").is_err());
        assert!(validate_company_code("no spaces").is_err());
    }

    #[test]
    fn validator_collects_field_errors() {
        let mut v = Validator::new();
        assert_eq!(v.required("name", "  Line 3 "), "Line 3");
        v.required("title", "   ");
        v.check(false, "severity", "is invalid");
        let err = v.finish().unwrap_err();
        match err {
            ApiError::ValidationError { field_errors: Some(fields), message } => {
                assert_eq!(fields["title"], "is required");
                assert_eq!(fields["severity"], "is invalid");
                assert!(message.contains("title is required"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn scope_hides_foreign_rows() {
        use crate::database::Incident;
        use crate::database::IncidentSeverity;

        let tenant = Uuid::new_v4();
        let incident = Incident::new(
            tenant,
            Uuid::new_v4(),
            "spill".into(),
            "oil".into(),
            IncidentSeverity::High,
            None,
        );
        let own = TenantScope::Tenant(tenant);
        let foreign = TenantScope::Tenant(Uuid::new_v4());

        assert!(within_scope(Some(incident.clone()), &own, "Incident").is_ok());
        assert!(within_scope(Some(incident.clone()), &TenantScope::All, "Incident").is_ok());
        let err = within_scope(Some(incident), &foreign, "Incident").unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
    }
}
