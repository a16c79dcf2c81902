//! Fixtures shared by unit tests.

use axum::http::{header, HeaderMap, HeaderValue};
use chrono::Duration;

use crate::auth::{SessionCodec, SessionCookie, Sessions};

pub const TEST_SECRET: &[u8] = b"plantops-unit-test-secret-0123456789";

/// Session codec with a fixed secret and a one hour lifetime.
pub fn test_sessions() -> Sessions {
    let codec = SessionCodec::new(TEST_SECRET, Duration::hours(1)).expect("test codec");
    let cookie = SessionCookie {
        name: "plantops_session".to_string(),
        secure: false,
        max_age_secs: 3600,
    };
    Sessions::new(codec, cookie)
}

/// Request headers carrying `token` in the session cookie.
pub fn cookie_headers(sessions: &Sessions, token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let value = format!("{}={}", sessions.cookie.name, token);
    headers.insert(
        header::COOKIE,
        HeaderValue::from_str(&value).expect("cookie header"),
    );
    headers
}
