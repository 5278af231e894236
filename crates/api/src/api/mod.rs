// HTTP API building blocks
//
// Shared request context, error documents and the ServiceResult translator
// used by every route module.

pub mod common;
pub mod context;
pub mod responses;

// Re-export common types
pub use common::ErrorResponse;
pub use context::RequestContext;
pub use responses::{handle_service_result, translate, ValidationProblem};
