use axum::http::{header, HeaderMap};

/// Attributes of the session cookie.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub name: String,
    pub secure: bool,
    pub max_age_secs: i64,
}

impl SessionCookie {
    /// `Set-Cookie` value carrying `token`.
    pub fn set(&self, token: &str) -> String {
        self.render(token, self.max_age_secs)
    }

    /// `Set-Cookie` value that removes the session.
    pub fn clear(&self) -> String {
        self.render("", 0)
    }

    fn render(&self, value: &str, max_age: i64) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.name, value, max_age
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Extract a cookie value from the request's `Cookie` headers.
///
/// Empty values count as absent.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(values: &[&str]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for v in values {
            map.append(header::COOKIE, HeaderValue::from_str(v).unwrap());
        }
        map
    }

    #[test]
    fn finds_named_cookie_among_others() {
        let h = headers(&["theme=dark; plantops_session=abc.def.ghi; lang=en"]);
        assert_eq!(read_cookie(&h, "plantops_session").as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn searches_every_cookie_header() {
        let h = headers(&["theme=dark", "plantops_session=tok"]);
        assert_eq!(read_cookie(&h, "plantops_session").as_deref(), Some("tok"));
    }

    #[test]
    fn missing_or_empty_cookie_is_none() {
        assert_eq!(read_cookie(&HeaderMap::new(), "plantops_session"), None);
        let h = headers(&["plantops_session=; theme=dark"]);
        assert_eq!(read_cookie(&h, "plantops_session"), None);
        let h = headers(&["plantops_session_old=tok"]);
        assert_eq!(read_cookie(&h, "plantops_session"), None);
    }

    #[test]
    fn renders_set_and_clear() {
        let cookie = SessionCookie {
            name: "plantops_session".to_string(),
            secure: true,
            max_age_secs: 3600,
        };
        let set = cookie.set("tok");
        assert!(set.starts_with("plantops_session=tok;"));
        assert!(set.contains("HttpOnly"));
        assert!(set.contains("Max-Age=3600"));
        assert!(set.ends_with("; Secure"));

        let cleared = cookie.clear();
        assert!(cleared.starts_with("plantops_session=;"));
        assert!(cleared.contains("Max-Age=0"));
    }
}
