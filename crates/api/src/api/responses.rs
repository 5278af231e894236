// ServiceResult -> HTTP response translation
//
// Every handler funnels its ServiceResult through here. Success maps to the
// payload (JSON body or file download), failure maps to a validation-problem
// document with a fixed 400 status.

use std::collections::BTreeMap;

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use budget_core::{ErrorDetail, Payload, ServiceResult};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;
use utoipa::ToSchema;

use super::common::found;
use super::context::RequestContext;

/// Key under which an operation's error messages are reported.
pub const MODEL_ERRORS_KEY: &str = "Model";

/// Title of every validation problem.
pub const PROBLEM_TITLE: &str = "Bad request";

/// Content type of validation problem documents.
pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

const DEFAULT_FILE_CONTENT_TYPE: &str = "application/octet-stream";

const JSON_CONTENT_TYPE: &str = "application/json";

/// Problem extensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProblemExtensions {
    /// Correlation id of the failed request.
    pub trace_id: String,
}

/// Validation problem document returned for every failed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValidationProblem {
    /// `"Error <code>"`
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    /// `"<METHOD> <path>"` of the failed request.
    pub instance: String,
    pub extensions: ProblemExtensions,
    /// Messages keyed by source; operations report under `"Model"`.
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ValidationProblem {
    pub fn from_error(error: &ErrorDetail, ctx: &RequestContext) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(MODEL_ERRORS_KEY.to_string(), error.errors.clone());

        Self {
            problem_type: format!("Error {}", error.code),
            title: PROBLEM_TITLE.to_string(),
            status: StatusCode::BAD_REQUEST.as_u16(),
            detail: error.description.clone(),
            instance: ctx.instance(),
            extensions: ProblemExtensions {
                trace_id: ctx.trace_id.clone(),
            },
            errors,
        }
    }
}

impl IntoResponse for ValidationProblem {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            [(header::CONTENT_TYPE, PROBLEM_CONTENT_TYPE)],
            Json(self),
        )
            .into_response()
    }
}

/// Translate an untyped result: empty body on success.
pub fn handle_service_result(
    result: ServiceResult,
    ctx: &RequestContext,
    custom_status: Option<StatusCode>,
) -> Response {
    let result = match result {
        ServiceResult::Success {
            data: Some(Payload::Data(())),
            status_code,
        } => ServiceResult::Success {
            data: None,
            status_code,
        },
        other => other,
    };

    translate(result, ctx, custom_status)
}

/// Translate a typed result.
///
/// File payloads always answer 200 and ignore `custom_status`. Plain data and
/// empty successes answer `custom_status`, or 200. Failures answer 400 with a
/// [`ValidationProblem`]; the result's own status hint is not consulted.
pub fn translate<T: Serialize>(
    result: ServiceResult<T>,
    ctx: &RequestContext,
    custom_status: Option<StatusCode>,
) -> Response {
    match result {
        ServiceResult::Success { data, .. } => match data {
            Some(Payload::StreamFile(file)) => file_response(
                Body::from_stream(file.content),
                &file.content_type,
                &file.file_download_name,
            ),
            Some(Payload::ByteArrayFile(file)) => file_response(
                Body::from(file.bytes),
                &file.content_type,
                &file.file_download_name,
            ),
            Some(Payload::Data(data)) => match serde_json::to_vec(&data) {
                Ok(body) => (
                    custom_status.unwrap_or(StatusCode::OK),
                    [(header::CONTENT_TYPE, JSON_CONTENT_TYPE)],
                    body,
                )
                    .into_response(),
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        instance = %ctx.instance(),
                        trace_id = %ctx.trace_id,
                        "Failed to serialize response payload"
                    );
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            },
            None => custom_status.unwrap_or(StatusCode::OK).into_response(),
        },
        ServiceResult::Failure { error, .. } => {
            tracing::debug!(
                code = %error.code,
                instance = %ctx.instance(),
                trace_id = %ctx.trace_id,
                "Operation failed"
            );
            ValidationProblem::from_error(&error, ctx).into_response()
        }
    }
}

/// Redirect to the error page with a message and optional status hint.
pub fn error_page(message: &str, status_code: Option<u16>) -> Response {
    let status = status_code.map(|c| c.to_string()).unwrap_or_default();
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("message", message)
        .append_pair("statusCode", &status)
        .finish();

    found(&format!("/Error?{query}"))
}

/// Redirect to the error page for a failed result, using its status hint.
pub fn error_page_for<T>(result: &ServiceResult<T>) -> Response {
    let message = result
        .error()
        .map(|e| e.description.as_str())
        .unwrap_or_default();
    error_page(message, result.status_code())
}

fn file_response(body: Body, content_type: &str, file_download_name: &str) -> Response {
    let content_type = Some(content_type)
        .filter(|ct| !ct.is_empty())
        .and_then(|ct| HeaderValue::from_str(ct).ok())
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_FILE_CONTENT_TYPE));

    let mut response = (StatusCode::OK, body).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    if let Some(disposition) = content_disposition(file_download_name) {
        headers.insert(header::CONTENT_DISPOSITION, disposition);
    }
    response
}

/// `attachment` disposition with an ASCII fallback name and an RFC 5987
/// `filename*` carrying the exact name.
fn content_disposition(file_name: &str) -> Option<HeaderValue> {
    if file_name.is_empty() {
        return Some(HeaderValue::from_static("attachment"));
    }

    let fallback: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c == ' ' || c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect();
    let encoded = form_urlencoded::byte_serialize(file_name.as_bytes())
        .collect::<String>()
        .replace('+', "%20");

    HeaderValue::from_str(&format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}"
    ))
    .ok()
}
