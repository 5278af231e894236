// Budget API Library
// Decision: Shared library for binaries (API server, OpenAPI export)

// Request context, result translation and shared DTOs
pub mod api;

// App router assembly
pub mod app;

// Authentication module
pub mod auth;

// Server configuration
pub mod config;

// Services layer
pub mod services;

// OpenAPI spec generation
pub mod openapi;

pub use app::build_app;
pub use config::ServerConfig;
