// Authentication contracts
//
// Request/response DTOs for the authentication endpoints and the AuthService
// trait that route handlers call. Implementations own password storage,
// token issuance and the provider code exchange; handlers only see results.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::service_result::ServiceResult;

/// Register request
#[derive(Debug, Clone, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Login request
#[derive(Debug, Clone, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Forgot password request
#[derive(Debug, Clone, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Reset password request
#[derive(Debug, Clone, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    /// Reset token issued by the forgot-password flow.
    pub token: String,
    pub password: String,
    pub confirm_password: String,
}

/// Query parameters delivered to the external login callback.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
#[serde(rename_all = "camelCase")]
pub struct ExternalLoginCallback {
    /// Provider that issued the callback.
    pub provider: Option<String>,
    /// Authorization code returned by the provider.
    pub code: Option<String>,
    pub state: Option<String>,
    #[serde(alias = "ReturnUrl")]
    pub return_url: Option<String>,
    /// Error reported by the provider instead of a code.
    pub remote_error: Option<String>,
}

/// Token response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

/// Identity operations behind the authentication endpoints.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn register(&self, request: RegisterRequest) -> ServiceResult;

    async fn login(&self, request: LoginRequest) -> ServiceResult<TokenResponse>;

    async fn forgot_password(&self, request: ForgotPasswordRequest) -> ServiceResult;

    async fn reset_password(&self, request: ResetPasswordRequest) -> ServiceResult;

    async fn handle_external_login(
        &self,
        callback: ExternalLoginCallback,
    ) -> ServiceResult<TokenResponse>;

    /// Resolve an access token to the id of the user it was issued to.
    async fn current_user_id(&self, access_token: &str) -> Option<String>;
}
