use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

use crate::error::Result;
use crate::schemas::{SignupRequest, SignupResponse};
use crate::services::signup::register_account;
use crate::state::AppState;

/// Create public account routes
pub fn auth_routes(state: AppState) -> Router {
    Router::new()
        .route("/signup", post(signup))
        .with_state(state)
}

/// Create an account and publish its hostname
///
/// Returns 201 once the account is committed, whether or not the hostname
/// went live; `hosting` says which.
#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 201, body = SignupResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username taken or no subdomain variant left")
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>)> {
    let response =
        register_account(&state.db, &state.provisioner, state.service_url(), request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
