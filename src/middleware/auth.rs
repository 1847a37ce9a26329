//! Operator authentication for maintenance routes
//!
//! Requires `Authorization: Bearer <CV_OPERATOR_TOKEN>`. When no operator
//! token is configured the guarded routes are unavailable.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::services::security::secrets_match;
use crate::state::AppState;

/// Middleware that admits only requests carrying the operator token
pub async fn require_operator_token(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.config.provisioning.operator_token.as_deref() else {
        return AppError::ServiceUnavailable("Operator endpoints are disabled".to_string())
            .into_response();
    };

    let token = match extract_bearer_token(&req) {
        Some(t) => t,
        None => {
            return AppError::Unauthorized("Missing or invalid Authorization header".to_string())
                .into_response();
        }
    };

    if !secrets_match(&token, expected) {
        tracing::warn!(path = %req.uri().path(), "Rejected request with wrong operator token");
        return AppError::Unauthorized("Invalid operator token".to_string()).into_response();
    }

    next.run(req).await
}

/// Extract Bearer token from Authorization header
fn extract_bearer_token(req: &Request) -> Option<String> {
    let auth_header = req.headers().get(AUTHORIZATION)?;
    let auth_str = auth_header.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?;
    Some(token.to_string())
}
