// External login challenge
// Decision: Build the provider authorization URL directly; the code exchange
// happens behind AuthService::handle_external_login

use rand::Rng;
use thiserror::Error;
use url::Url;

use super::config::{AuthConfig, ExternalProviderConfig};

/// Base path of the authentication routes.
pub const AUTH_BASE_PATH: &str = "/api/authentication";

/// Errors building an external login challenge
#[derive(Debug, Error)]
pub enum ChallengeError {
    #[error("external login provider '{0}' is not configured")]
    UnknownProvider(String),
    #[error("invalid external login URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Builds the redirect that starts an external login.
pub trait ExternalLoginChallenge: Send + Sync {
    /// Provider URL the browser is sent to; the provider redirects back to
    /// `callback_url` once the user has signed in.
    fn challenge_url(&self, provider: &str, callback_url: &str) -> Result<String, ChallengeError>;
}

/// OAuth2 authorization-code challenge for configured providers
pub struct OAuthChallenge {
    providers: Vec<ExternalProviderConfig>,
}

impl OAuthChallenge {
    pub fn new(providers: Vec<ExternalProviderConfig>) -> Self {
        Self { providers }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.providers.clone())
    }
}

impl ExternalLoginChallenge for OAuthChallenge {
    fn challenge_url(&self, provider: &str, callback_url: &str) -> Result<String, ChallengeError> {
        let config = self
            .providers
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(provider))
            .ok_or_else(|| ChallengeError::UnknownProvider(provider.to_string()))?;

        let mut url = Url::parse(&config.authorize_url)?;
        url.query_pairs_mut()
            .append_pair("client_id", &config.client_id)
            .append_pair("redirect_uri", callback_url)
            .append_pair("response_type", "code")
            .append_pair("scope", &config.scope)
            .append_pair("state", &generate_state());

        Ok(url.into())
    }
}

/// Callback URL the provider returns to, carrying the provider name and the
/// caller's return URL.
pub fn callback_url(
    config: &AuthConfig,
    provider: &str,
    return_url: Option<&str>,
) -> Result<String, ChallengeError> {
    let mut url = Url::parse(&format!(
        "{}{}{}/external-login-callback",
        config.base_url.trim_end_matches('/'),
        config.api_prefix,
        AUTH_BASE_PATH
    ))?;

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("provider", provider);
        if let Some(return_url) = return_url.filter(|r| !r.is_empty()) {
            query.append_pair("ReturnUrl", return_url);
        }
    }

    Ok(url.into())
}

/// Random state string for the OAuth round trip (32 hex characters)
fn generate_state() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    hex::encode(bytes)
}
