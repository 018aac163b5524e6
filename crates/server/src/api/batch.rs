//! Batch API handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use std::sync::Arc;

use reelforge_core::BatchReport;

use super::errors::{api_error, processor_error, ApiError};
use crate::state::AppState;

/// Request body for running a batch
#[derive(Debug, Default, Deserialize)]
pub struct RunBatchBody {
    /// Maximum items to process (default: scheduler.batch_size)
    #[serde(default)]
    pub max_items: Option<usize>,
}

/// Run one batch over the oldest pending items
pub async fn run_batch(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RunBatchBody>,
) -> Result<Json<BatchReport>, ApiError> {
    let max_items = body
        .max_items
        .unwrap_or(state.config().scheduler.batch_size);
    if max_items == 0 {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "max_items must be greater than 0",
        ));
    }

    let report = state
        .service()
        .run_batch(max_items)
        .await
        .map_err(|e| processor_error(&e))?;

    Ok(Json(report))
}
