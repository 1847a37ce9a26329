use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::services::name_allocator::AllocationError;
use crate::services::provisioning::ProvisionError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Subdomain allocation failed: {0}")]
    Allocation(#[from] AllocationError),

    #[error("Provisioning failed: {0}")]
    Provisioning(#[from] ProvisionError),
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::Validation(e) => (StatusCode::BAD_REQUEST, format!("Invalid input: {}", e)),
            AppError::Allocation(e) => match e {
                AllocationError::Exhausted { .. } => (
                    StatusCode::CONFLICT,
                    "No subdomain is available for this name, please choose a different one"
                        .to_string(),
                ),
                AllocationError::EmptyName => (StatusCode::BAD_REQUEST, e.to_string()),
                AllocationError::TooLong { .. } => (
                    StatusCode::BAD_REQUEST,
                    "Name is too long for a subdomain, please use a shorter one".to_string(),
                ),
                AllocationError::Database(db) => {
                    tracing::error!("Database error during subdomain allocation: {}", db);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Database error".to_string(),
                    )
                }
            },
            AppError::Provisioning(e) => {
                tracing::error!(stage = %e.stage(), "Provisioning error: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    format!("Hostname provisioning failed at stage '{}'", e.stage()),
                )
            }
        };

        (status, Json(ErrorResponse { detail: message })).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
