// Service result model
//
// Every business operation reports its outcome as a ServiceResult. The HTTP
// layer turns it into a response in exactly one place, so services never
// pick status codes or body shapes themselves.

use std::fmt;

use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};

/// Byte stream backing a streamed file payload.
pub type FileStream = BoxStream<'static, std::io::Result<Vec<u8>>>;

/// Structured failure reported by a business operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g. "DuplicateEmail").
    pub code: String,
    /// Human-readable summary.
    pub description: String,
    /// Field or validation messages, in the order they were produced.
    pub errors: Vec<String>,
}

impl ErrorDetail {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            errors: Vec::new(),
        }
    }

    /// Append a single validation message.
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.errors.push(message.into());
        self
    }

    /// Append several validation messages, keeping their order.
    pub fn with_errors<I, S>(mut self, messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.errors.extend(messages.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.description)
    }
}

/// File delivered from an in-memory or generated byte stream.
pub struct FileStreamResponse {
    pub content: FileStream,
    pub content_type: String,
    pub file_download_name: String,
}

impl FileStreamResponse {
    pub fn new(
        content: FileStream,
        content_type: impl Into<String>,
        file_download_name: impl Into<String>,
    ) -> Self {
        Self {
            content,
            content_type: content_type.into(),
            file_download_name: file_download_name.into(),
        }
    }

    /// Wrap an in-memory buffer as a single-chunk stream.
    pub fn from_bytes(
        bytes: Vec<u8>,
        content_type: impl Into<String>,
        file_download_name: impl Into<String>,
    ) -> Self {
        let content = stream::once(async move { Ok::<_, std::io::Error>(bytes) }).boxed();
        Self::new(content, content_type, file_download_name)
    }
}

impl fmt::Debug for FileStreamResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStreamResponse")
            .field("content_type", &self.content_type)
            .field("file_download_name", &self.file_download_name)
            .finish_non_exhaustive()
    }
}

/// File delivered from a raw byte buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileByteArrayResponse {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub file_download_name: String,
}

impl FileByteArrayResponse {
    pub fn new(
        bytes: Vec<u8>,
        content_type: impl Into<String>,
        file_download_name: impl Into<String>,
    ) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
            file_download_name: file_download_name.into(),
        }
    }
}

/// What a successful operation hands back.
#[derive(Debug)]
pub enum Payload<T> {
    /// Plain data, serialized as the response body.
    Data(T),
    /// Streamed file download.
    StreamFile(FileStreamResponse),
    /// Raw byte-array file download.
    ByteArrayFile(FileByteArrayResponse),
}

/// Outcome of a business operation.
///
/// `ServiceResult<()>` is the untyped form used by operations that only
/// report success or failure. A result is either a success with an optional
/// payload or a failure with an error; never both.
#[derive(Debug)]
pub enum ServiceResult<T = ()> {
    Success {
        data: Option<Payload<T>>,
        /// Advisory status hint set by the operation.
        status_code: Option<u16>,
    },
    Failure {
        error: ErrorDetail,
        /// Advisory status hint set by the operation.
        status_code: Option<u16>,
    },
}

impl<T> ServiceResult<T> {
    /// Success without a payload.
    pub fn ok() -> Self {
        Self::Success {
            data: None,
            status_code: None,
        }
    }

    /// Success carrying plain data.
    pub fn success(data: T) -> Self {
        Self::Success {
            data: Some(Payload::Data(data)),
            status_code: None,
        }
    }

    /// Success carrying a streamed file.
    pub fn success_file_stream(file: FileStreamResponse) -> Self {
        Self::Success {
            data: Some(Payload::StreamFile(file)),
            status_code: None,
        }
    }

    /// Success carrying a byte-array file.
    pub fn success_file_bytes(file: FileByteArrayResponse) -> Self {
        Self::Success {
            data: Some(Payload::ByteArrayFile(file)),
            status_code: None,
        }
    }

    pub fn failure(error: ErrorDetail) -> Self {
        Self::Failure {
            error,
            status_code: None,
        }
    }

    /// Attach an advisory status hint.
    pub fn with_status_code(self, code: u16) -> Self {
        match self {
            Self::Success { data, .. } => Self::Success {
                data,
                status_code: Some(code),
            },
            Self::Failure { error, .. } => Self::Failure {
                error,
                status_code: Some(code),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn data(&self) -> Option<&Payload<T>> {
        match self {
            Self::Success { data, .. } => data.as_ref(),
            Self::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorDetail> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Success { status_code, .. } | Self::Failure { status_code, .. } => *status_code,
        }
    }
}

impl<T> From<ErrorDetail> for ServiceResult<T> {
    fn from(error: ErrorDetail) -> Self {
        Self::failure(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_has_no_payload_or_error() {
        let result: ServiceResult = ServiceResult::ok();
        assert!(result.is_success());
        assert!(result.data().is_none());
        assert!(result.error().is_none());
        assert_eq!(result.status_code(), None);
    }

    #[test]
    fn test_success_carries_data() {
        let result = ServiceResult::success("token".to_string()).with_status_code(200);
        assert!(result.is_success());
        assert!(matches!(result.data(), Some(Payload::Data(d)) if d == "token"));
        assert_eq!(result.status_code(), Some(200));
    }

    #[test]
    fn test_failure_never_carries_data() {
        let error = ErrorDetail::new("DuplicateEmail", "Registration failed")
            .with_error("Email already registered");
        let result: ServiceResult<String> = ServiceResult::failure(error.clone());

        assert!(!result.is_success());
        assert!(result.data().is_none());
        assert_eq!(result.error(), Some(&error));
    }

    #[test]
    fn test_status_hint_survives_on_failure() {
        let result: ServiceResult =
            ServiceResult::failure(ErrorDetail::new("NotFound", "Missing")).with_status_code(404);
        assert_eq!(result.status_code(), Some(404));
        assert!(!result.is_success());
    }

    #[test]
    fn test_error_detail_keeps_message_order() {
        let error = ErrorDetail::new("Invalid", "Invalid input")
            .with_error("first")
            .with_errors(["second", "third"]);
        assert_eq!(error.errors, vec!["first", "second", "third"]);
        assert_eq!(error.to_string(), "Invalid: Invalid input");
    }

    #[test]
    fn test_file_payload_variants() {
        let bytes = FileByteArrayResponse::new(vec![1, 2, 3], "application/pdf", "report.pdf");
        let result: ServiceResult<()> = ServiceResult::success_file_bytes(bytes.clone());
        assert!(matches!(result.data(), Some(Payload::ByteArrayFile(f)) if *f == bytes));

        let stream = FileStreamResponse::from_bytes(b"a,b".to_vec(), "text/csv", "export.csv");
        let result: ServiceResult<()> = ServiceResult::success_file_stream(stream);
        match result.data() {
            Some(Payload::StreamFile(f)) => {
                assert_eq!(f.content_type, "text/csv");
                assert_eq!(f.file_download_name, "export.csv");
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stream_from_bytes_yields_buffer() {
        let file = FileStreamResponse::from_bytes(b"hello".to_vec(), "text/plain", "a.txt");
        let chunks: Vec<_> = file.content.collect().await;
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].as_ref().unwrap(), b"hello");
    }
}
