// Common DTOs and helpers for the public API
//
// These types are shared across multiple API endpoints.

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standard error response for endpoints outside the result protocol.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message describing what went wrong.
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    /// Convert to axum response tuple
    pub fn into_response(self, status: StatusCode) -> (StatusCode, Json<Self>) {
        (status, Json(self))
    }
}

/// 302 Found pointing at `location`.
///
/// axum's `Redirect` only offers 303/307/308; browser-facing flows here
/// expect a plain 302.
pub fn found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
        Err(_) => {
            tracing::error!(location = %location, "Redirect target is not a valid header value");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Whether the request was issued by a script (`X-Requested-With: XMLHttpRequest`).
pub fn is_ajax_request(headers: &HeaderMap) -> bool {
    headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_found_sets_location() {
        let response = found("https://example.com/callback?x=1");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://example.com/callback?x=1"
        );
    }

    #[test]
    fn test_found_rejects_invalid_location() {
        let response = found("bad\nlocation");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_is_ajax_request() {
        let mut headers = HeaderMap::new();
        assert!(!is_ajax_request(&headers));

        headers.insert("x-requested-with", HeaderValue::from_static("xmlhttprequest"));
        assert!(is_ajax_request(&headers));

        headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));
        assert!(is_ajax_request(&headers));

        headers.insert("x-requested-with", HeaderValue::from_static("fetch"));
        assert!(!is_ajax_request(&headers));
    }

    #[test]
    fn test_error_response_into_response() {
        let (status, Json(body)) = ErrorResponse::new("nope").into_response(StatusCode::BAD_REQUEST);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "nope");
    }
}
