use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::cookie::{read_cookie, SessionCookie};
use super::role::Role;
use crate::config::AppConfig;

/// Authenticated principal carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    pub user_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub role: Role,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub role: Role,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    fn new(payload: &SessionPayload, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            user_id: payload.user_id,
            tenant_id: payload.tenant_id,
            role: payload.role,
            username: payload.username.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        }
    }
}

impl From<Claims> for SessionPayload {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            tenant_id: claims.tenant_id,
            role: claims.role,
            username: claims.username,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session secret is empty")]
    EmptySecret,
    #[error("session expiry of {0} hours is out of range")]
    InvalidExpiry(u64),
    #[error("token generation failed: {0}")]
    TokenGeneration(#[from] jsonwebtoken::errors::Error),
}

/// Signs and verifies stateless session tokens (HS256 JWT).
#[derive(Clone)]
pub struct SessionCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCodec")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionCodec {
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, SessionError> {
        if secret.is_empty() {
            return Err(SessionError::EmptySecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, payload: &SessionPayload) -> Result<String, SessionError> {
        self.issue_at(payload, Utc::now())
    }

    /// Issue a token as if it were minted at `issued_at`.
    pub fn issue_at(
        &self,
        payload: &SessionPayload,
        issued_at: DateTime<Utc>,
    ) -> Result<String, SessionError> {
        let claims = Claims::new(payload, issued_at, self.ttl);
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// `None` for missing, malformed, forged or expired tokens. Never fails loudly.
    pub fn verify(&self, token: &str) -> Option<SessionPayload> {
        if token.is_empty() {
            return None;
        }
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => Some(data.claims.into()),
            Err(e) => {
                tracing::debug!("session token rejected: {}", e);
                None
            }
        }
    }
}

/// Token codec plus the cookie that carries it.
#[derive(Debug, Clone)]
pub struct Sessions {
    pub codec: SessionCodec,
    pub cookie: SessionCookie,
}

impl Sessions {
    pub fn new(codec: SessionCodec, cookie: SessionCookie) -> Self {
        Self { codec, cookie }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, SessionError> {
        let hours = config.security.session_expiry_hours;
        let ttl = i64::try_from(hours)
            .ok()
            .and_then(Duration::try_hours)
            .ok_or(SessionError::InvalidExpiry(hours))?;
        let codec = SessionCodec::new(config.security.session_secret.as_bytes(), ttl)?;
        let cookie = SessionCookie {
            name: config.security.cookie_name.clone(),
            secure: config.security.cookie_secure,
            max_age_secs: ttl.num_seconds(),
        };
        Ok(Self::new(codec, cookie))
    }

    pub fn token_from(&self, headers: &HeaderMap) -> Option<String> {
        read_cookie(headers, &self.cookie.name)
    }

    /// Resolve the request's session, if it carries a valid one.
    pub fn resolve(&self, headers: &HeaderMap) -> Option<SessionPayload> {
        self.token_from(headers)
            .and_then(|token| self.codec.verify(&token))
    }

    /// `Set-Cookie` value for a freshly issued session.
    pub fn start(&self, payload: &SessionPayload) -> Result<String, SessionError> {
        let token = self.codec.issue(payload)?;
        Ok(self.cookie.set(&token))
    }
}
