// Authentication configuration loaded from environment variables.
// Decision: AUTH_ prefix for all auth config
// Decision: An external provider is enabled only when its client id is set

use std::time::Duration;

/// Provider used when the external-login request names none.
pub const DEFAULT_EXTERNAL_PROVIDER: &str = "Facebook";

/// Longest accepted access token lifetime (one year); longer values are clamped.
pub const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Built-in external providers: (name, authorize URL, default scope).
const KNOWN_PROVIDERS: [(&str, &str, &str); 3] = [
    (
        "Facebook",
        "https://www.facebook.com/v19.0/dialog/oauth",
        "email public_profile",
    ),
    (
        "Google",
        "https://accounts.google.com/o/oauth2/v2/auth",
        "openid email profile",
    ),
    (
        "GitHub",
        "https://github.com/login/oauth/authorize",
        "read:user user:email",
    ),
];

/// External identity provider configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalProviderConfig {
    /// Display name, matched case-insensitively (e.g. "Facebook")
    pub name: String,
    pub client_id: String,
    pub authorize_url: String,
    pub scope: String,
}

/// Complete authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Public base URL used to build callback URLs
    pub base_url: String,
    /// Prefix all API routes are nested under (e.g. "/v1")
    pub api_prefix: String,
    /// Provider used when none is requested
    pub default_provider: String,
    /// Enabled external providers
    pub providers: Vec<ExternalProviderConfig>,
    /// Lifetime of issued access tokens
    pub token_lifetime: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9000".to_string(),
            api_prefix: String::new(),
            default_provider: DEFAULT_EXTERNAL_PROVIDER.to_string(),
            providers: Vec::new(),
            token_lifetime: Duration::from_secs(60 * 60), // 1 hour
        }
    }
}

impl AuthConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// Keys:
    /// - `AUTH_BASE_URL` / `BASE_URL`
    /// - `API_PREFIX`
    /// - `AUTH_DEFAULT_PROVIDER`
    /// - `AUTH_TOKEN_LIFETIME` (seconds, at most [`MAX_TOKEN_LIFETIME`])
    /// - `AUTH_<PROVIDER>_CLIENT_ID`, `AUTH_<PROVIDER>_AUTHORIZE_URL`, `AUTH_<PROVIDER>_SCOPE`
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let base_url = non_empty("AUTH_BASE_URL")
            .or_else(|| non_empty("BASE_URL"))
            .unwrap_or(defaults.base_url);

        let api_prefix = non_empty("API_PREFIX").unwrap_or_default();

        let default_provider =
            non_empty("AUTH_DEFAULT_PROVIDER").unwrap_or(defaults.default_provider);

        let token_lifetime = non_empty("AUTH_TOKEN_LIFETIME")
            .and_then(|s| s.parse().ok())
            .map(|secs| Duration::from_secs(secs).min(MAX_TOKEN_LIFETIME))
            .unwrap_or(defaults.token_lifetime);

        let providers = KNOWN_PROVIDERS
            .iter()
            .filter_map(|(name, authorize_url, scope)| {
                let key = name.to_uppercase();
                let client_id = non_empty(&format!("AUTH_{key}_CLIENT_ID"))?;
                Some(ExternalProviderConfig {
                    name: name.to_string(),
                    client_id,
                    authorize_url: non_empty(&format!("AUTH_{key}_AUTHORIZE_URL"))
                        .unwrap_or_else(|| authorize_url.to_string()),
                    scope: non_empty(&format!("AUTH_{key}_SCOPE"))
                        .unwrap_or_else(|| scope.to_string()),
                })
            })
            .collect();

        Self {
            base_url,
            api_prefix,
            default_provider,
            providers,
            token_lifetime,
        }
    }

    /// Find an enabled provider by name (case-insensitive)
    pub fn provider(&self, name: &str) -> Option<&ExternalProviderConfig> {
        self.providers
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name.as_str()).collect()
    }
}
