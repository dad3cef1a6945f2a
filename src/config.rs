//! Process-wide configuration: a single init step reading the environment,
//! then read-only access from anywhere without locking.

use std::sync::OnceLock;
use std::time::Duration;

/// CORS policy, mirrored from `CORS_*` environment variables.
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub enabled: bool,
    pub allow_origin: String,
    pub allow_methods: String,
    pub allow_headers: String,
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_origin: "*".to_string(),
            allow_methods: "GET, POST, PUT, DELETE, OPTIONS".to_string(),
            allow_headers: "*".to_string(),
            max_age: None,
        }
    }
}

impl CorsConfig {
    fn from_env() -> Self {
        let default = Self::default();
        Self {
            enabled: env_bool("CORS_ENABLED", default.enabled),
            allow_origin: env_string("CORS_ALLOW_ORIGIN", &default.allow_origin),
            allow_methods: env_string("CORS_ALLOW_METHODS", &default.allow_methods),
            allow_headers: env_string("CORS_ALLOW_HEADERS", &default.allow_headers),
            max_age: std::env::var("CORS_MAX_AGE").ok().and_then(|v| v.parse().ok()),
        }
    }
}

/// Process-wide configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Expected API key (`PROXY_API_KEY`). Empty means misconfigured.
    pub proxy_api_key: String,
    pub cors: CorsConfig,
    /// Max accepted `/v1/messages` body size, in bytes.
    pub request_body_limit: usize,
    /// Per-account deadline used by the health/account-limits quota fan-out.
    pub quota_fetch_timeout: Duration,
    pub debug: bool,
}

impl Config {
    fn from_env() -> Self {
        Self {
            proxy_api_key: std::env::var("PROXY_API_KEY").unwrap_or_default(),
            cors: CorsConfig::from_env(),
            request_body_limit: std::env::var("REQUEST_BODY_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10 * 1024 * 1024),
            quota_fetch_timeout: Duration::from_millis(
                std::env::var("QUOTA_FETCH_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(2_000),
            ),
            debug: env_bool("DEBUG", false),
        }
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(v) => !matches!(v.to_ascii_lowercase().as_str(), "false" | "0" | "no"),
        Err(_) => default,
    }
}

fn env_string(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Loads configuration from the environment the first time it's called;
/// every later call returns the same instance.
pub fn config() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}
