// Budget API Core
//
// Framework-free building blocks shared by the HTTP layer and service
// implementations.
//
// Key design decisions:
// - Business operations return ServiceResult instead of raising errors
// - The payload kind (plain data vs. file) is a closed enum, not a runtime type check
// - AuthService is the only seam between route handlers and identity management

pub mod auth;
pub mod service_result;

// Telemetry (tracing subscriber + optional OTLP export)
pub mod telemetry;

// Re-exports for convenience
pub use auth::{
    AuthService, ExternalLoginCallback, ForgotPasswordRequest, LoginRequest, RegisterRequest,
    ResetPasswordRequest, TokenResponse,
};
pub use service_result::{
    ErrorDetail, FileByteArrayResponse, FileStream, FileStreamResponse, Payload, ServiceResult,
};
