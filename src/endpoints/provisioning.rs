use axum::{
    extract::{Path, State},
    middleware as axum_middleware,
    routing::post,
    Json, Router,
};
use sea_orm::EntityTrait;

use crate::error::{AppError, Result};
use crate::middleware::require_operator_token;
use crate::models::prelude::*;
use crate::services::provisioning::ProvisionedHostname;
use crate::state::AppState;

/// Operator routes under /api/users
pub fn provisioning_routes(state: AppState) -> Router {
    Router::new()
        .route("/{id}/provision", post(reprovision_user))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_operator_token,
        ))
        .with_state(state)
}

/// Re-run hostname provisioning for a user's stored subdomain
#[utoipa::path(
    post,
    path = "/api/users/{id}/provision",
    tag = "Provisioning",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, body = ProvisionedHostname),
        (status = 401, description = "Missing or wrong operator token"),
        (status = 404, description = "Unknown user"),
        (status = 502, description = "A provider stage failed")
    ),
    security(("operator_token" = []))
)]
pub async fn reprovision_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProvisionedHostname>> {
    let user = User::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

    tracing::info!(user_id = id, subdomain = %user.subdomain_name, "Re-provisioning hostname");

    let provisioned = state
        .provisioner
        .provision(&user.subdomain_name, state.service_url())
        .await?;

    Ok(Json(provisioned))
}
