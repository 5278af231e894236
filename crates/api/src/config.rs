// HTTP server configuration loaded from environment variables.

use axum::http::HeaderValue;

/// Default listen address
pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:9000";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP server binds to (`HTTP_ADDR`)
    pub http_addr: String,
    /// Prefix all API routes are nested under (`API_PREFIX`, e.g. "/api")
    pub api_prefix: String,
    /// Allowed CORS origins (`CORS_ALLOWED_ORIGINS`, comma separated).
    /// Only needed when the UI is served from a different origin than the API.
    pub cors_origins: Vec<HeaderValue>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            api_prefix: String::new(),
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let http_addr = lookup("HTTP_ADDR")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());

        let api_prefix = lookup("API_PREFIX")
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .unwrap_or_default();

        let cors_origins = lookup("CORS_ALLOWED_ORIGINS")
            .filter(|s| !s.is_empty())
            .map(|s| s.split(',').filter_map(|s| s.trim().parse().ok()).collect())
            .unwrap_or_default();

        Self {
            http_addr,
            api_prefix,
            cors_origins,
        }
    }
}
