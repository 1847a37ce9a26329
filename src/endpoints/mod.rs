pub mod auth;
pub mod provisioning;

use axum::{extract::State, routing::get, Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::schemas::{HostingStatus, SignupRequest, SignupResponse, UserResponse};
use crate::services::provisioning::{ProvisionStage, ProvisionedHostname};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(auth::signup, provisioning::reprovision_user),
    components(schemas(
        SignupRequest,
        SignupResponse,
        UserResponse,
        HostingStatus,
        ProvisionStage,
        ProvisionedHostname
    )),
    modifiers(&OperatorTokenScheme),
    tags(
        (name = "Auth", description = "Account creation"),
        (name = "Provisioning", description = "Operator hostname maintenance")
    )
)]
pub struct ApiDoc;

struct OperatorTokenScheme;

impl Modify for OperatorTokenScheme {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "operator_token",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/system/health", get(health_check))
        .route("/api/system/version", get(get_version))
        .route("/api/openapi.json", get(openapi_json))
        .with_state(state.clone())
        .nest("/auth", auth::auth_routes(state.clone()))
        .nest("/api/users", provisioning::provisioning_routes(state))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Version info endpoint
async fn get_version(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "version": state.config.version,
        "commit_hash": state.config.commit_hash,
        "build_time": state.config.build_time,
        "rust_version": env!("CARGO_PKG_RUST_VERSION"),
        "backend": "rust"
    }))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
