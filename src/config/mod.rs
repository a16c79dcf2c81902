use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

/// Session secret used when none is configured. Only accepted outside production.
pub const DEVELOPMENT_SESSION_SECRET: &str = "plantops-development-secret-do-not-use-in-prod";

const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Longest accepted session lifetime: one year.
pub const MAX_SESSION_EXPIRY_HOURS: u64 = 24 * 365;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string. `None` selects the in-memory store.
    #[serde(skip_serializing)]
    pub url: Option<String>,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
    pub run_migrations: bool,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing, default)]
    pub session_secret: String,
    pub session_expiry_hours: u64,
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub cors_origins: Vec<String>,
}

// The session secret never reaches log output.
impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("session_secret", &"<redacted>")
            .field("session_expiry_hours", &self.session_expiry_hours)
            .field("cookie_name", &self.cookie_name)
            .field("cookie_secure", &self.cookie_secure)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct BootstrapConfig {
    pub username: Option<String>,
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
}

impl fmt::Debug for BootstrapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("PLANTOPS_SESSION_SECRET must be set in production")]
    DefaultSecretInProduction,
    #[error("PLANTOPS_SESSION_SECRET must be at least {0} bytes in production")]
    SecretTooShort(usize),
    #[error("session secret must not be empty")]
    EmptySecret,
    #[error("session expiry must be between 1 and {} hours", MAX_SESSION_EXPIRY_HOURS)]
    InvalidExpiry,
    #[error("cookie name must not be empty")]
    EmptyCookieName,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        Self::for_environment(environment).with_env_overrides()
    }

    /// Preset defaults for an environment, without reading any variables.
    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("PLANTOPS_HOST") {
            self.server.host = v;
        }
        if let Some(port) = env::var("PLANTOPS_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            if !v.trim().is_empty() {
                self.database.url = Some(v);
            }
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECT_TIMEOUT_SECS") {
            self.database.connect_timeout_secs =
                v.parse().unwrap_or(self.database.connect_timeout_secs);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // Security overrides
        if let Ok(v) = env::var("PLANTOPS_SESSION_SECRET") {
            self.security.session_secret = v;
        }
        if let Ok(v) = env::var("PLANTOPS_SESSION_EXPIRY_HOURS") {
            self.security.session_expiry_hours =
                v.parse().unwrap_or(self.security.session_expiry_hours);
        }
        if let Ok(v) = env::var("PLANTOPS_COOKIE_NAME") {
            self.security.cookie_name = v;
        }
        if let Ok(v) = env::var("PLANTOPS_COOKIE_SECURE") {
            self.security.cookie_secure = v.parse().unwrap_or(self.security.cookie_secure);
        }
        if let Ok(v) = env::var("PLANTOPS_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Bootstrap
        if let Ok(v) = env::var("PLANTOPS_BOOTSTRAP_USERNAME") {
            self.bootstrap.username = Some(v);
        }
        if let Ok(v) = env::var("PLANTOPS_BOOTSTRAP_PASSWORD") {
            self.bootstrap.password = Some(v);
        }

        self
    }

    /// Reject configurations that must never start.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let secret = &self.security.session_secret;
        if secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        if self.environment == Environment::Production {
            if secret == DEVELOPMENT_SESSION_SECRET {
                return Err(ConfigError::DefaultSecretInProduction);
            }
            if secret.len() < MIN_PRODUCTION_SECRET_LEN {
                return Err(ConfigError::SecretTooShort(MIN_PRODUCTION_SECRET_LEN));
            }
        }
        if !(1..=MAX_SESSION_EXPIRY_HOURS).contains(&self.security.session_expiry_hours) {
            return Err(ConfigError::InvalidExpiry);
        }
        if self.security.cookie_name.trim().is_empty() {
            return Err(ConfigError::EmptyCookieName);
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub(crate) fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                connect_timeout_secs: 30,
                run_migrations: true,
            },
            security: SecurityConfig {
                session_secret: DEVELOPMENT_SESSION_SECRET.to_string(),
                session_expiry_hours: 24 * 7, // 1 week
                cookie_name: "plantops_session".to_string(),
                cookie_secure: false,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
            },
            bootstrap: BootstrapConfig::default(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connect_timeout_secs: 10,
                run_migrations: true,
            },
            security: SecurityConfig {
                session_secret: DEVELOPMENT_SESSION_SECRET.to_string(),
                session_expiry_hours: 24,
                cookie_name: "plantops_session".to_string(),
                cookie_secure: true,
                cors_origins: vec!["https://staging.plantops.example.com".to_string()],
            },
            bootstrap: BootstrapConfig::default(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connect_timeout_secs: 5,
                run_migrations: false,
            },
            security: SecurityConfig {
                // Must be supplied through PLANTOPS_SESSION_SECRET; validate() rejects this.
                session_secret: DEVELOPMENT_SESSION_SECRET.to_string(),
                session_expiry_hours: 12,
                cookie_name: "plantops_session".to_string(),
                cookie_secure: true,
                cors_origins: vec!["https://plantops.example.com".to_string()],
            },
            bootstrap: BootstrapConfig::default(),
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!(
            $crate::config::CONFIG.environment,
            $crate::config::Environment::Production
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.server.port, 3000);
        assert!(config.database.url.is_none());
        assert!(!config.security.cookie_secure);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_rejects_default_secret() {
        let config = AppConfig::production();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DefaultSecretInProduction)
        ));
    }

    #[test]
    fn test_production_rejects_short_secret() {
        let mut config = AppConfig::production();
        config.security.session_secret = "too-short".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::SecretTooShort(32))));

        config.security.session_secret = "x".repeat(48);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_expiry_rejected() {
        let mut config = AppConfig::development();
        config.security.session_expiry_hours = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidExpiry)));
    }

    #[test]
    fn test_expiry_upper_bound() {
        let mut config = AppConfig::development();
        config.security.session_expiry_hours = MAX_SESSION_EXPIRY_HOURS;
        assert!(config.validate().is_ok());
        config.security.session_expiry_hours = MAX_SESSION_EXPIRY_HOURS + 1;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidExpiry)));
        config.security.session_expiry_hours = u64::MAX;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidExpiry)));
    }

    #[test]
    fn test_debug_output_redacts_secret() {
        let mut config = AppConfig::development();
        config.security.session_secret = "super-secret-value".to_string();
        config.bootstrap.password = Some("hunter2".to_string());
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret-value"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_serialized_config_omits_secret() {
        let config = AppConfig::development();
        let value = serde_json::to_value(&config).unwrap();
        assert!(value["security"].get("session_secret").is_none());
        assert!(value["database"].get("url").is_none());
    }
}
