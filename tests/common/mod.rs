#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use plantops::auth::{hash_password, Role, SessionCodec, SessionCookie, Sessions};
use plantops::database::{Store, Tenant, User};
use plantops::middleware::RouteRoleMap;
use plantops::{build_router, AppState};

pub const PASSWORD: &str = "correct-horse-42";
const SECRET: &[u8] = b"plantops-integration-secret-0123456789";

static SERVER: OnceLock<TestServer> = OnceLock::new();

/// The real `plantops` binary on a free port, in-memory storage.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_plantops"));
        cmd.env("PLANTOPS_PORT", port.to_string())
            .env("PLANTOPS_HOST", "127.0.0.1")
            .env("APP_ENV", "development")
            .env_remove("DATABASE_URL")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Router over seeded in-memory storage: two companies, Acme and Globex.
pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub acme: Tenant,
    pub globex: Tenant,
}

impl TestApp {
    pub async fn new() -> Self {
        let store = Store::in_memory();
        let acme = store
            .tenants
            .create(Tenant::new("Acme Foundry".to_string(), "ACME".to_string()))
            .await
            .expect("seed acme");
        let globex = store
            .tenants
            .create(Tenant::new("Globex Plastics".to_string(), "GLOBEX".to_string()))
            .await
            .expect("seed globex");

        let codec = SessionCodec::new(SECRET, chrono::Duration::hours(1)).expect("codec");
        let cookie = SessionCookie {
            name: "plantops_session".to_string(),
            secure: false,
            max_age_secs: 3600,
        };
        let state = AppState::new(
            store,
            Sessions::new(codec, cookie),
            RouteRoleMap::plantops_default(),
        );
        let router = build_router(state.clone());

        Self { state, router, acme, globex }
    }

    /// User whose password is never checked.
    pub async fn user(&self, tenant: Option<Uuid>, username: &str, role: Role) -> User {
        self.insert(User::new(tenant, username.to_string(), "!".to_string(), role, None))
            .await
    }

    /// User that can sign in with [`PASSWORD`].
    pub async fn login_user(&self, tenant: Option<Uuid>, username: &str, role: Role) -> User {
        let hash = hash_password(PASSWORD).expect("hash");
        self.insert(User::new(tenant, username.to_string(), hash, role, None))
            .await
    }

    async fn insert(&self, user: User) -> User {
        self.state.store.users.create(user).await.expect("seed user")
    }

    /// `Cookie` header value carrying a fresh session for `user`.
    pub fn cookie(&self, user: &User) -> String {
        let token = self
            .state
            .sessions
            .codec
            .issue(&user.session_payload())
            .expect("issue token");
        format!("{}={}", self.state.sessions.cookie.name, token)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.router.clone().oneshot(request).await.expect("oneshot");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse { status, headers, body }
    }

    pub async fn get(&self, uri: &str, cookie: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(cookie), None).await
    }

    pub async fn post(&self, uri: &str, cookie: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(cookie), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, cookie: &str, body: Value) -> TestResponse {
        self.request(Method::PATCH, uri, Some(cookie), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, cookie: &str) -> TestResponse {
        self.request(Method::DELETE, uri, Some(cookie), None).await
    }
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn error(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }

    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}
