use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Json},
    routing::{delete, get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{SessionError, Sessions};
use crate::config::AppConfig;
use crate::database::Store;
use crate::error::ApiError;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{edge_guard, RouteRoleMap};

/// Shared, read-only request context.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub sessions: Arc<Sessions>,
    pub routes: Arc<RouteRoleMap>,
}

impl AppState {
    pub fn new(store: Store, sessions: Sessions, routes: RouteRoleMap) -> Self {
        Self {
            store,
            sessions: Arc::new(sessions),
            routes: Arc::new(routes),
        }
    }

    pub fn from_config(config: &AppConfig, store: Store) -> Result<Self, SessionError> {
        Ok(Self::new(
            store,
            Sessions::from_config(config)?,
            RouteRoleMap::plantops_default(),
        ))
    }
}

/// Full HTTP surface. The edge guard wraps every route and the fallback.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_routes())
        .merge(tenant_routes())
        .merge(user_routes())
        .merge(checklist_routes())
        .merge(incident_routes())
        .merge(message_routes())
        .merge(shipment_routes())
        .merge(document_routes())
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), edge_guard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the configured browser origins. Cookies require explicit origins.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(public::login))
        .route("/api/auth/logout", post(public::logout))
        .route("/api/auth/me", get(protected::auth::me))
}

fn tenant_routes() -> Router<AppState> {
    use elevated::tenants;

    Router::new()
        .route("/api/tenants", get(tenants::list).post(tenants::create))
        .route(
            "/api/tenants/:id",
            get(tenants::get)
                .patch(tenants::update)
                .delete(tenants::delete),
        )
}

fn user_routes() -> Router<AppState> {
    use protected::users;

    Router::new()
        .route("/api/users", get(users::list).post(users::create))
        .route(
            "/api/users/:id",
            get(users::get).patch(users::update).delete(users::delete),
        )
}

fn checklist_routes() -> Router<AppState> {
    use protected::checklists;

    Router::new()
        .route(
            "/api/checklists/templates",
            get(checklists::list_templates).post(checklists::create_template),
        )
        .route(
            "/api/checklists/templates/:id",
            get(checklists::get_template)
                .patch(checklists::update_template)
                .delete(checklists::delete_template),
        )
        .route(
            "/api/checklists/submissions",
            get(checklists::list_submissions).post(checklists::create_submission),
        )
        .route(
            "/api/checklists/submissions/:id",
            get(checklists::get_submission),
        )
}

fn incident_routes() -> Router<AppState> {
    use protected::incidents;

    Router::new()
        .route("/api/incidents", get(incidents::list).post(incidents::create))
        .route(
            "/api/incidents/:id",
            get(incidents::get)
                .patch(incidents::update)
                .delete(incidents::delete),
        )
}

fn message_routes() -> Router<AppState> {
    use protected::messages;

    Router::new()
        .route(
            "/api/messages/groups",
            get(messages::list_groups).post(messages::create_group),
        )
        .route("/api/messages/groups/:id", delete(messages::delete_group))
        .route(
            "/api/messages/groups/:id/messages",
            get(messages::list_messages).post(messages::post_message),
        )
}

fn shipment_routes() -> Router<AppState> {
    use protected::shipments;

    Router::new()
        .route("/api/shipments", get(shipments::list).post(shipments::create))
        .route(
            "/api/shipments/:id",
            get(shipments::get)
                .patch(shipments::update)
                .delete(shipments::delete),
        )
}

fn document_routes() -> Router<AppState> {
    use protected::documents;

    Router::new()
        .route(
            "/api/documents/folders",
            get(documents::list_folders).post(documents::create_folder),
        )
        .route(
            "/api/documents/folders/:id",
            delete(documents::delete_folder),
        )
        .route(
            "/api/documents/folders/:id/documents",
            get(documents::list_documents).post(documents::create_document),
        )
        .route("/api/documents/:id", delete(documents::delete_document))
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "PlantOps API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Multi-tenant manufacturing operations backend",
            "endpoints": {
                "auth": "/api/auth/login, /api/auth/logout, /api/auth/me",
                "tenants": "/api/tenants[/:id] (super_admin)",
                "users": "/api/users[/:id] (admin, owner)",
                "checklists": "/api/checklists/templates[/:id], /api/checklists/submissions[/:id]",
                "incidents": "/api/incidents[/:id]",
                "messages": "/api/messages/groups[/:id[/messages]]",
                "shipments": "/api/shipments[/:id]",
                "documents": "/api/documents/folders[/:id[/documents]], /api/documents/:id",
                "health": "/health",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let storage = state.store.backend_name();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "storage": storage,
                    "durable": state.store.is_durable(),
                }
            })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "storage unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "storage": storage,
                    }
                })),
            )
        }
    }
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No route for {}", uri.path()))
}
