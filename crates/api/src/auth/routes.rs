// Authentication HTTP routes
// Decision: Use /api/authentication/* for all auth endpoints
// Decision: Handlers call exactly one AuthService operation and hand the result to the translator unchanged

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use budget_core::{
    ExternalLoginCallback, ForgotPasswordRequest, LoginRequest, RegisterRequest,
    ResetPasswordRequest, TokenResponse,
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::external::callback_url;
use super::middleware::AuthState;
use crate::api::common::found;
use crate::api::{handle_service_result, translate, ErrorResponse, RequestContext, ValidationProblem};

/// External login query parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct ExternalLoginQuery {
    /// Provider name; the configured default when omitted
    pub provider: Option<String>,
    /// Where the client wants to land after signing in
    #[serde(alias = "ReturnUrl")]
    pub return_url: Option<String>,
}

/// Create auth routes
pub fn routes(state: AuthState) -> Router {
    Router::new()
        .route("/api/authentication/register", post(register))
        .route("/api/authentication/login", post(login))
        .route("/api/authentication/forgot-password", post(forgot_password))
        .route("/api/authentication/reset-password", post(reset_password))
        // External login
        .route("/api/authentication/external-login", get(external_login))
        .route(
            "/api/authentication/external-login-callback",
            get(external_login_callback),
        )
        .with_state(state)
}

/// POST /api/authentication/register - Register a new account
#[utoipa::path(
    post,
    path = "/api/authentication/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account registered"),
        (status = 400, description = "Registration rejected", body = ValidationProblem, content_type = "application/problem+json")
    ),
    tag = "authentication"
)]
pub async fn register(
    State(state): State<AuthState>,
    ctx: RequestContext,
    Json(req): Json<RegisterRequest>,
) -> Response {
    let result = state.service.register(req).await;
    handle_service_result(result, &ctx, None)
}

/// POST /api/authentication/login - Login with email and password
#[utoipa::path(
    post,
    path = "/api/authentication/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = TokenResponse),
        (status = 400, description = "Login rejected", body = ValidationProblem, content_type = "application/problem+json")
    ),
    tag = "authentication"
)]
pub async fn login(
    State(state): State<AuthState>,
    ctx: RequestContext,
    Json(req): Json<LoginRequest>,
) -> Response {
    let result = state.service.login(req).await;
    translate(result, &ctx, None)
}

/// POST /api/authentication/forgot-password - Start a password reset
#[utoipa::path(
    post,
    path = "/api/authentication/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset started if the account exists"),
        (status = 400, description = "Request rejected", body = ValidationProblem, content_type = "application/problem+json")
    ),
    tag = "authentication"
)]
pub async fn forgot_password(
    State(state): State<AuthState>,
    ctx: RequestContext,
    Json(req): Json<ForgotPasswordRequest>,
) -> Response {
    let result = state.service.forgot_password(req).await;
    handle_service_result(result, &ctx, None)
}

/// POST /api/authentication/reset-password - Set a new password with a reset token
#[utoipa::path(
    post,
    path = "/api/authentication/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset"),
        (status = 400, description = "Reset rejected", body = ValidationProblem, content_type = "application/problem+json")
    ),
    tag = "authentication"
)]
pub async fn reset_password(
    State(state): State<AuthState>,
    ctx: RequestContext,
    Json(req): Json<ResetPasswordRequest>,
) -> Response {
    let result = state.service.reset_password(req).await;
    handle_service_result(result, &ctx, None)
}

/// GET /api/authentication/external-login - Redirect to an external provider
#[utoipa::path(
    get,
    path = "/api/authentication/external-login",
    params(ExternalLoginQuery),
    responses(
        (status = 302, description = "Redirect to the provider sign-in page"),
        (status = 400, description = "Provider not configured", body = ErrorResponse)
    ),
    tag = "authentication"
)]
pub async fn external_login(
    State(state): State<AuthState>,
    Query(query): Query<ExternalLoginQuery>,
) -> Response {
    let provider = query
        .provider
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| state.config.default_provider.clone());

    let challenge = callback_url(&state.config, &provider, query.return_url.as_deref())
        .and_then(|callback| state.challenge.challenge_url(&provider, &callback));

    match challenge {
        Ok(url) => {
            tracing::debug!(provider = %provider, "Starting external login");
            found(&url)
        }
        Err(e) => {
            tracing::warn!(provider = %provider, error = %e, "Failed to start external login");
            ErrorResponse::new(e.to_string())
                .into_response(StatusCode::BAD_REQUEST)
                .into_response()
        }
    }
}

/// GET /api/authentication/external-login-callback - Complete an external login
#[utoipa::path(
    get,
    path = "/api/authentication/external-login-callback",
    params(ExternalLoginCallback),
    responses(
        (status = 200, description = "Signed in", body = TokenResponse),
        (status = 400, description = "External login failed", body = ValidationProblem, content_type = "application/problem+json")
    ),
    tag = "authentication"
)]
pub async fn external_login_callback(
    State(state): State<AuthState>,
    ctx: RequestContext,
    Query(callback): Query<ExternalLoginCallback>,
) -> Response {
    let result = state.service.handle_external_login(callback).await;
    translate(result, &ctx, None)
}
