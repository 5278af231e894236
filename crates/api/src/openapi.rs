// OpenAPI specification generation
//
// Used by the API server (for Swagger UI) and by the export-openapi binary
// (for static spec generation).

use budget_core::{
    ExternalLoginCallback, ForgotPasswordRequest, LoginRequest, RegisterRequest,
    ResetPasswordRequest, TokenResponse,
};
use utoipa::OpenApi;

use crate::api::responses::ProblemExtensions;
use crate::api::{ErrorResponse, ValidationProblem};
use crate::auth;

/// OpenAPI documentation for the Budget API
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::routes::register,
        auth::routes::login,
        auth::routes::forgot_password,
        auth::routes::reset_password,
        auth::routes::external_login,
        auth::routes::external_login_callback,
    ),
    components(
        schemas(
            RegisterRequest, LoginRequest, ForgotPasswordRequest, ResetPasswordRequest,
            ExternalLoginCallback, TokenResponse,
            ValidationProblem, ProblemExtensions, ErrorResponse,
        )
    ),
    tags(
        (name = "authentication", description = "Account registration, sign-in and password recovery")
    ),
    info(
        title = "Budget API",
        version = "0.1.0",
        description = "Authentication endpoints of the Budget API",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate the OpenAPI spec as a pretty-printed JSON string
    pub fn to_json() -> Result<String, serde_json::Error> {
        Self::openapi().to_pretty_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_auth_paths_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/authentication/register",
            "/api/authentication/login",
            "/api/authentication/forgot-password",
            "/api/authentication/reset-password",
            "/api/authentication/external-login",
            "/api/authentication/external-login-callback",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_schemas_registered() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().unwrap().schemas;
        assert!(schemas.contains_key("ValidationProblem"));
        assert!(schemas.contains_key("TokenResponse"));
    }

    #[test]
    fn test_to_json() {
        let json = ApiDoc::to_json().unwrap();
        assert!(json.contains("\"title\": \"Budget API\""));
    }
}
