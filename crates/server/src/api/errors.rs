//! Mapping from domain errors to HTTP responses.

use axum::{http::StatusCode, Json};
use serde::Serialize;
use tracing::error;

use reelforge_core::{MigrationError, ProcessorError, StoreError};

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub fn store_error(e: &StoreError) -> ApiError {
    match e {
        StoreError::NotFound(_) => api_error(StatusCode::NOT_FOUND, e.to_string()),
        StoreError::InvalidTransition { .. } => api_error(StatusCode::CONFLICT, e.to_string()),
        StoreError::Unavailable(_) => {
            error!("Status store unavailable: {}", e);
            api_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
    }
}

pub fn processor_error(e: &ProcessorError) -> ApiError {
    match e {
        ProcessorError::NotFound(_) => api_error(StatusCode::NOT_FOUND, e.to_string()),
        ProcessorError::InvalidState { .. }
        | ProcessorError::RetryLimitExceeded { .. }
        | ProcessorError::InFlight(_) => api_error(StatusCode::CONFLICT, e.to_string()),
        ProcessorError::Store(inner) => store_error(inner),
    }
}

pub fn migration_error(e: &MigrationError) -> ApiError {
    match e {
        MigrationError::AlreadyRunning => api_error(StatusCode::CONFLICT, e.to_string()),
        MigrationError::Store(inner) => store_error(inner),
    }
}
