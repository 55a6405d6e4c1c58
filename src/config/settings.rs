use std::env;
use std::net::SocketAddr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::config::constants::*;
use crate::error::{AppError, Result};

/// Main configuration container for the application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,
    /// Database settings
    pub database: DatabaseConfig,
    /// Admin credentials and session settings
    pub admin: AdminConfig,
    /// Access link lifetimes
    pub access: AccessConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment variables or use defaults
    pub fn load() -> Self {
        Self {
            server: ServerConfig::load(),
            database: DatabaseConfig::load(),
            admin: AdminConfig::load(),
            access: AccessConfig::load(),
            logging: LoggingConfig::load(),
        }
    }

    /// Reject settings the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            return Err(AppError::config("Server host cannot be empty"));
        }
        if self.server.worker_threads == 0 || self.server.worker_threads > 256 {
            return Err(AppError::config(format!(
                "Invalid worker_threads: {}. Must be between 1 and 256",
                self.server.worker_threads
            )));
        }
        if self.admin.username.is_empty() || self.admin.password.is_empty() {
            return Err(AppError::config(
                "ADMIN_USERNAME and ADMIN_PASSWORD must be set",
            ));
        }
        if self.admin.session_ttl_hours <= 0 {
            return Err(AppError::config("ADMIN_SESSION_TTL_HOURS must be positive"));
        }
        if self.access.admin_link_ttl_days <= 0 || self.access.self_link_ttl_hours <= 0 {
            return Err(AppError::config("Access link TTLs must be positive"));
        }
        if !crate::validation::is_http_url(&self.server.public_base_url) {
            return Err(AppError::config(format!(
                "Invalid PUBLIC_BASE_URL: {}",
                self.server.public_base_url
            )));
        }
        Ok(())
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// HTTP server configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to listen on
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Number of actix worker threads
    pub worker_threads: usize,
    /// Base URL used when building public profile links
    pub public_base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HTTP_HOST.to_string(),
            port: DEFAULT_HTTP_PORT,
            worker_threads: DEFAULT_WORKER_THREADS,
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn load() -> Self {
        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_PUBLIC_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| DEFAULT_HTTP_HOST.to_string()),
            port: env_parse("SERVER_PORT", DEFAULT_HTTP_PORT),
            worker_threads: env_parse("WORKER_THREADS", DEFAULT_WORKER_THREADS),
            public_base_url,
        }
    }

    /// Get socket address from host and port
    pub fn address(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse::<SocketAddr>()
            .map_err(|e| AppError::config(format!("Invalid server address: {}", e)))
    }

    /// Public URL of the profile view for `token`.
    pub fn profile_url(&self, token: &str) -> String {
        format!("{}/user/{}", self.public_base_url, token)
    }
}

/// Database configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `mysql://` connection URL; `None` selects the in-memory backend
    pub url: Option<String>,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub connection_timeout: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: DEFAULT_DB_POOL,
            connection_timeout: DEFAULT_DB_CONN_TIMEOUT_SECS,
        }
    }
}

impl DatabaseConfig {
    pub fn load() -> Self {
        Self {
            url: env::var("DATABASE_URL").ok().filter(|u| !u.is_empty()),
            max_connections: env_parse("DB_POOL", DEFAULT_DB_POOL),
            connection_timeout: env_parse("DATABASE_CONNECTION_TIMEOUT", DEFAULT_DB_CONN_TIMEOUT_SECS),
        }
    }
}

/// Admin credentials and session signing settings
#[derive(Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
    /// HMAC key for admin session tokens; generated at startup when absent
    pub session_secret: Option<String>,
    pub session_ttl_hours: i64,
    /// Set the `Secure` attribute on the session cookie
    pub cookie_secure: bool,
}

// Keeps credentials out of debug logs.
impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("session_secret", &self.session_secret.as_ref().map(|_| "<redacted>"))
            .field("session_ttl_hours", &self.session_ttl_hours)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            session_secret: None,
            session_ttl_hours: DEFAULT_ADMIN_SESSION_TTL_HOURS,
            cookie_secure: false,
        }
    }
}

impl AdminConfig {
    pub fn load() -> Self {
        Self {
            username: env::var("ADMIN_USERNAME").unwrap_or_default(),
            password: env::var("ADMIN_PASSWORD").unwrap_or_default(),
            session_secret: env::var("ADMIN_SESSION_SECRET").ok().filter(|s| !s.is_empty()),
            session_ttl_hours: env_parse("ADMIN_SESSION_TTL_HOURS", DEFAULT_ADMIN_SESSION_TTL_HOURS),
            cookie_secure: env_flag("COOKIE_SECURE", false),
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::hours(self.session_ttl_hours)
    }
}

/// Access link lifetimes and legacy token handling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Lifetime of links generated by an administrator
    pub admin_link_ttl_days: i64,
    /// Lifetime of links issued by user self-login
    pub self_link_ttl_hours: i64,
    /// Accept pre-ledger JSON tokens on the profile route
    pub legacy_fallback: bool,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            admin_link_ttl_days: DEFAULT_ADMIN_LINK_TTL_DAYS,
            self_link_ttl_hours: DEFAULT_SELF_LINK_TTL_HOURS,
            legacy_fallback: true,
        }
    }
}

impl AccessConfig {
    pub fn load() -> Self {
        Self {
            admin_link_ttl_days: env_parse("ADMIN_LINK_TTL_DAYS", DEFAULT_ADMIN_LINK_TTL_DAYS),
            self_link_ttl_hours: env_parse("SELF_LINK_TTL_HOURS", DEFAULT_SELF_LINK_TTL_HOURS),
            legacy_fallback: env_flag("LEGACY_TOKEN_FALLBACK", true),
        }
    }

    pub fn admin_link_ttl(&self) -> Duration {
        Duration::days(self.admin_link_ttl_days)
    }

    pub fn self_link_ttl(&self) -> Duration {
        Duration::hours(self.self_link_ttl_hours)
    }
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of the compact format
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    pub fn load() -> Self {
        Self {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string()),
            json: env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.admin.username = "admin".to_string();
        config.admin.password = "hunter2-pw".to_string();
        config.admin.session_secret = Some("signing-key-value".to_string());
        config
    }

    #[test]
    fn test_defaults_match_link_lifetimes() {
        let access = AccessConfig::default();
        assert_eq!(access.admin_link_ttl(), Duration::days(7));
        assert_eq!(access.self_link_ttl(), Duration::hours(24));
        assert!(access.legacy_fallback);
    }

    #[test]
    fn test_validate_requires_admin_credentials() {
        assert!(Config::default().validate().is_err());
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_positive_ttl() {
        let mut config = valid_config();
        config.access.self_link_ttl_hours = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_malformed_public_base_url() {
        for bad in ["https://not a url", "certs.example.org", "ftp://certs.example.org", ""] {
            let mut config = valid_config();
            config.server.public_base_url = bad.to_string();
            assert!(config.validate().is_err(), "accepted {bad:?}");
        }
        let mut config = valid_config();
        config.server.public_base_url = "http://localhost:8080".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_profile_url() {
        let server = ServerConfig {
            public_base_url: "https://certs.example.org".to_string(),
            ..ServerConfig::default()
        };
        assert_eq!(server.profile_url("abc"), "https://certs.example.org/user/abc");
    }

    #[test]
    fn test_admin_debug_redacts_password() {
        let config = valid_config();
        let rendered = format!("{:?}", config.admin);
        assert!(!rendered.contains("hunter2-pw"));
        assert!(!rendered.contains("signing-key-value"));
        assert!(rendered.contains("<redacted>"));
    }
}
