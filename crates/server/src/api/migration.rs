//! Migration API handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use reelforge_core::{MigrationOptions, MigrationRun};

use super::errors::{migration_error, ApiError};
use crate::state::AppState;

/// Response for a stop request
#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub message: String,
    pub run: MigrationRun,
}

/// Start a migration over the whole catalog
pub async fn start(
    State(state): State<Arc<AppState>>,
    Json(options): Json<MigrationOptions>,
) -> Result<(StatusCode, Json<MigrationRun>), ApiError> {
    let run = state
        .service()
        .start_migration(options)
        .await
        .map_err(|e| migration_error(&e))?;

    Ok((StatusCode::ACCEPTED, Json(run)))
}

/// Ask the running migration to stop after the current item
pub async fn stop(State(state): State<Arc<AppState>>) -> Json<StopResponse> {
    let service = state.service();
    let message = if service.migration().is_running() {
        service.stop_migration();
        "Migration stopping after current item"
    } else {
        "No migration running"
    };

    Json(StopResponse {
        message: message.to_string(),
        run: service.get_migration_status(),
    })
}

/// Current or last migration snapshot
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<MigrationRun> {
    Json(state.service().get_migration_status())
}
