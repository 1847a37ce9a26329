//! Application bootstrapper
//!
//! Handles all initialization and setup for the cv-builder backend.

use axum::http::HeaderValue;
use axum::Router;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::server::ServerConfig;
use crate::config::{Config, LogFormat};
use crate::db;
use crate::endpoints;
use crate::services::provisioning::HostnameProvisioner;
use crate::state::AppState;

/// Bootstrap and run the application
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    init_tracing(&config.log_level, config.log_format);

    tracing::info!("Starting cv-builder backend v{}", config.version);

    let state = init_services(config).await?;
    let server = state.config.server.clone();
    let app = create_app(state, &server);

    serve(app, &server).await
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str, log_format: LogFormat) {
    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("cv_builder={},tower_http=info", log_level).into()),
    );

    match log_format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_ansi(false))
            .init(),
    }
}

/// Initialize all application services
async fn init_services(config: Config) -> anyhow::Result<AppState> {
    let conn = db::connect(&config.database).await?;
    tracing::info!("Database connection established");

    if !config.cloudflare.is_complete() {
        tracing::warn!(
            "Cloudflare credentials are incomplete; hostname provisioning will fail until CLOUDFLARE_TOKEN, CLOUDFLARE_ZONE_ID, CLOUDFLARE_ACCOUNT_ID and CLOUDFLARE_TUNNEL_ID are set"
        );
    }
    let provisioner = HostnameProvisioner::from_config(&config.cloudflare)?;
    tracing::info!(
        base_domain = %config.cloudflare.base_domain,
        tunnel_target = %config.cloudflare.tunnel_target(),
        "Hostname provisioner initialized"
    );

    if config.provisioning.operator_token.is_none() {
        tracing::info!("CV_OPERATOR_TOKEN not set, re-provision endpoint is disabled");
    }

    Ok(AppState::new(conn, provisioner, config))
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Create the main application router
pub fn create_app(state: AppState, server: &ServerConfig) -> Router {
    endpoints::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(server))
}

/// Start the HTTP server
async fn serve(app: Router, server: &ServerConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", server.host, server.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
