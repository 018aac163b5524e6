//! Media item API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use reelforge_core::{
    CreateMediaRequest, DerivedArtifacts, MediaFilter, MediaItem, ProcessingStatus,
};

use super::errors::{api_error, processor_error, store_error, ApiError};
use crate::state::AppState;

/// Maximum allowed limit for media queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for media queries
const DEFAULT_LIMIT: i64 = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for registering a media item
#[derive(Debug, Deserialize)]
pub struct CreateMediaBody {
    /// Where the worker fetches the source video from
    pub source_url: String,
    /// Optional display title
    pub title: Option<String>,
}

/// Query parameters for listing media items
#[derive(Debug, Deserialize)]
pub struct ListMediaParams {
    /// Filter by processing status
    pub status: Option<String>,
    /// Maximum number of items to return
    pub limit: Option<i64>,
    /// Pagination offset
    pub offset: Option<i64>,
}

/// Response for media operations
#[derive(Debug, Serialize)]
pub struct MediaResponse {
    pub id: String,
    pub source_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub status: ProcessingStatus,
    pub artifacts: DerivedArtifacts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub retry_count: u32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<MediaItem> for MediaResponse {
    fn from(item: MediaItem) -> Self {
        Self {
            id: item.id,
            source_url: item.source_url,
            title: item.title,
            status: item.status,
            artifacts: item.artifacts,
            last_error: item.last_error,
            retry_count: item.retry_count,
            created_at: item.created_at.to_rfc3339(),
            updated_at: item.updated_at.to_rfc3339(),
        }
    }
}

/// Response for listing media items
#[derive(Debug, Serialize)]
pub struct ListMediaResponse {
    pub media: Vec<MediaResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Processing status of a single item
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub id: String,
    pub status: String,
}

/// Result of a process or retry request
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub id: String,
    pub success: bool,
    pub status: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Register a new media item
pub async fn create_media(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateMediaBody>,
) -> Result<(StatusCode, Json<MediaResponse>), ApiError> {
    if body.source_url.trim().is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "source_url cannot be empty",
        ));
    }

    let item = state
        .store()
        .create(CreateMediaRequest {
            source_url: body.source_url,
            title: body.title,
        })
        .map_err(|e| store_error(&e))?;

    info!(media_id = %item.id, "Media item registered");
    Ok((StatusCode::CREATED, Json(MediaResponse::from(item))))
}

/// List media items
pub async fn list_media(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListMediaParams>,
) -> Result<Json<ListMediaResponse>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut filter = MediaFilter::new().with_limit(limit).with_offset(offset);
    if let Some(status) = params.status.as_deref() {
        let status = ProcessingStatus::parse(status).ok_or_else(|| {
            api_error(
                StatusCode::BAD_REQUEST,
                format!("Unknown status: {}", status),
            )
        })?;
        filter = filter.with_status(status);
    }

    let store = state.store();
    let items = store.list(&filter).map_err(|e| store_error(&e))?;
    let total = store.count(&filter).map_err(|e| store_error(&e))?;

    Ok(Json(ListMediaResponse {
        media: items.into_iter().map(MediaResponse::from).collect(),
        total,
        limit,
        offset,
    }))
}

/// Get a media item by ID
pub async fn get_media(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MediaResponse>, ApiError> {
    match state.store().get(&id).map_err(|e| store_error(&e))? {
        Some(item) => Ok(Json(MediaResponse::from(item))),
        None => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Media item not found: {}", id),
        )),
    }
}

/// Processing status string; "unknown" for items that cannot be found
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<StatusResponse> {
    let status = state.service().get_processing_status(&id);
    Json(StatusResponse { id, status })
}

/// Process a pending or failed item now
pub async fn process_media(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProcessResponse>, ApiError> {
    let service = state.service();
    let success = service
        .process_single_video(&id)
        .await
        .map_err(|e| processor_error(&e))?;

    Ok(Json(ProcessResponse {
        status: service.get_processing_status(&id),
        id,
        success,
    }))
}

/// Retry a failed item
pub async fn retry_media(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProcessResponse>, ApiError> {
    let service = state.service();
    let success = service
        .retry_failed_processing(&id)
        .await
        .map_err(|e| processor_error(&e))?;

    Ok(Json(ProcessResponse {
        status: service.get_processing_status(&id),
        id,
        success,
    }))
}
