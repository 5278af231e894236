// Per-request context handed explicitly to the result translator

use std::convert::Infallible;

use axum::extract::{FromRequestParts, OriginalUri};
use axum::http::{request::Parts, Method};
use uuid::Uuid;

/// Header carrying the per-request trace id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Method, path and trace id of the inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub method: Method,
    /// Request path without query string, including any nesting prefix.
    pub path: String,
    pub trace_id: String,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            trace_id: trace_id.into(),
        }
    }

    /// `"<METHOD> <path>"`, used as the problem `instance`.
    pub fn instance(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    fn from_parts(parts: &Parts) -> Self {
        // Nested routers see a stripped uri; OriginalUri keeps the full path
        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map(|uri| uri.0.path().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        let trace_id = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::now_v7().to_string());

        Self::new(parts.method.clone(), path, trace_id)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(request: Request<()>) -> Parts {
        request.into_parts().0
    }

    #[tokio::test]
    async fn test_extracts_method_path_and_request_id() {
        let mut parts = parts(
            Request::post("/api/authentication/login?x=1")
                .header(REQUEST_ID_HEADER, "req-123")
                .body(())
                .unwrap(),
        );

        let ctx = RequestContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ctx.method, Method::POST);
        assert_eq!(ctx.path, "/api/authentication/login");
        assert_eq!(ctx.trace_id, "req-123");
        assert_eq!(ctx.instance(), "POST /api/authentication/login");
    }

    #[tokio::test]
    async fn test_generates_trace_id_when_missing() {
        let mut parts = parts(Request::get("/health").body(()).unwrap());

        let ctx = RequestContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(Uuid::parse_str(&ctx.trace_id).is_ok());
    }

    #[tokio::test]
    async fn test_prefers_original_uri() {
        let mut parts = parts(Request::get("/register").body(()).unwrap());
        parts
            .extensions
            .insert(OriginalUri("/api/authentication/register".parse().unwrap()));

        let ctx = RequestContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ctx.path, "/api/authentication/register");
    }
}
