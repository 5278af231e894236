// Budget API server
// Decision: The in-memory AuthService backs the server until an identity store is wired in

use std::sync::Arc;

use anyhow::{Context, Result};
use budget_api::auth::{AuthConfig, AuthState};
use budget_api::services::InMemoryAuthService;
use budget_api::{build_app, ServerConfig};
use budget_core::telemetry::{init_telemetry, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present; real environment variables take precedence
    dotenvy::dotenv().ok();

    // Initialize telemetry with OpenTelemetry support
    // Configure via environment variables:
    // - OTEL_SERVICE_NAME: Service name (default: "budget-api")
    // - OTEL_EXPORTER_OTLP_ENDPOINT: OTLP endpoint (e.g., "http://localhost:4317")
    // - RUST_LOG: Log filter (default: "budget_api=debug,tower_http=debug")
    let mut telemetry_config = TelemetryConfig::from_env();
    if telemetry_config.log_filter.is_none() {
        telemetry_config.log_filter = Some("budget_api=debug,tower_http=debug".to_string());
    }
    telemetry_config.service_version = Some(env!("CARGO_PKG_VERSION").to_string());

    // Keep the guard alive for the lifetime of the application
    let _telemetry_guard = init_telemetry(telemetry_config);

    tracing::info!("budget-api starting...");

    let server_config = ServerConfig::from_env();
    if !server_config.api_prefix.is_empty() {
        tracing::info!(prefix = %server_config.api_prefix, "API prefix configured");
    }

    let mut auth_config = AuthConfig::from_env();
    auth_config.api_prefix = server_config.api_prefix.clone();
    tracing::info!(
        base_url = %auth_config.base_url,
        providers = ?auth_config.provider_names(),
        default_provider = %auth_config.default_provider,
        "Auth configuration loaded"
    );
    if auth_config.provider(&auth_config.default_provider).is_none() {
        tracing::warn!(
            provider = %auth_config.default_provider,
            "Default external login provider is not configured"
        );
    }

    tracing::warn!("Using in-memory auth service; accounts are lost on restart");
    let service = Arc::new(InMemoryAuthService::new(auth_config.token_lifetime));
    let auth_state = AuthState::new(auth_config, service);

    let app = build_app(&server_config, auth_state);

    // Start HTTP server
    let listener = tokio::net::TcpListener::bind(&server_config.http_addr)
        .await
        .with_context(|| format!("Failed to bind to address {}", server_config.http_addr))?;
    tracing::info!("HTTP server listening on {}", server_config.http_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
