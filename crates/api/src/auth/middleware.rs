// Authentication state and extractors
// Decision: The current user is an explicit extractor, resolved per request through AuthService
// Decision: Missing or unknown credentials yield an anonymous user, never a rejection

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header, request::Parts, HeaderMap};
use budget_core::AuthService;

use super::config::AuthConfig;
use super::external::{ExternalLoginChallenge, OAuthChallenge};

/// Auth state shared across routes
#[derive(Clone)]
pub struct AuthState {
    pub config: Arc<AuthConfig>,
    pub service: Arc<dyn AuthService>,
    pub challenge: Arc<dyn ExternalLoginChallenge>,
}

impl AuthState {
    pub fn new(config: AuthConfig, service: Arc<dyn AuthService>) -> Self {
        let challenge = Arc::new(OAuthChallenge::from_config(&config));
        Self {
            config: Arc::new(config),
            service,
            challenge,
        }
    }

    /// Replace the external login challenge builder
    pub fn with_challenge(mut self, challenge: Arc<dyn ExternalLoginChallenge>) -> Self {
        self.challenge = challenge;
        self
    }
}

/// Id of the signed-in user, if the request carries a valid bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub Option<String>);

impl CurrentUser {
    pub fn id(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let Some(token) = bearer_token(&parts.headers) else {
            return Ok(CurrentUser(None));
        };

        let user_id = auth_state.service.current_user_id(&token).await;
        if user_id.is_none() {
            tracing::debug!("Bearer token did not resolve to a user");
        }

        Ok(CurrentUser(user_id))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
