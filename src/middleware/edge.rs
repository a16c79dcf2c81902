//! Coarse page-level gate that runs before every handler.
//!
//! Exempt paths and unmatched paths pass straight through. A protected prefix
//! without a valid session redirects to login with a `from` return path; a
//! valid session with the wrong role redirects to that role's landing page.
//! Handlers still run their own [`crate::auth::authorize`] check.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::routes::RouteRoleMap;
use crate::app::AppState;
use crate::auth::SessionPayload;

/// Terminal outcome of the edge check for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeDecision {
    Exempt,
    NoMatch,
    Unauthenticated { location: String },
    Unauthorized { location: String },
    Authorized,
}

impl EdgeDecision {
    pub fn redirect_location(&self) -> Option<&str> {
        match self {
            EdgeDecision::Unauthenticated { location } | EdgeDecision::Unauthorized { location } => {
                Some(location)
            }
            _ => None,
        }
    }
}

/// Decide what happens to a request for `path`. `return_to` is what the login
/// page should send the user back to (path plus query).
pub fn evaluate(
    routes: &RouteRoleMap,
    path: &str,
    return_to: &str,
    session: Option<&SessionPayload>,
) -> EdgeDecision {
    if routes.is_exempt(path) {
        return EdgeDecision::Exempt;
    }

    let Some(rule) = routes.match_path(path) else {
        return EdgeDecision::NoMatch;
    };

    let Some(session) = session else {
        return EdgeDecision::Unauthenticated {
            location: routes.login_redirect(return_to),
        };
    };

    if rule.permits(session.role) {
        EdgeDecision::Authorized
    } else {
        EdgeDecision::Unauthorized {
            location: routes.landing_for(session.role).to_string(),
        }
    }
}

pub async fn edge_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let return_to = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| path.clone());

    let session = state.sessions.resolve(request.headers());
    let decision = evaluate(&state.routes, &path, &return_to, session.as_ref());

    match decision {
        EdgeDecision::Exempt | EdgeDecision::NoMatch | EdgeDecision::Authorized => {
            next.run(request).await
        }
        EdgeDecision::Unauthenticated { location } => {
            tracing::debug!("edge: unauthenticated request for {} redirected to login", path);
            found(location)
        }
        EdgeDecision::Unauthorized { location } => {
            if let Some(session) = &session {
                tracing::info!(
                    user_id = %session.user_id,
                    role = %session.role,
                    "edge: {} not permitted, redirecting to {}",
                    path,
                    location
                );
            }
            found(location)
        }
    }
}

fn found(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}
