use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{batch, handlers, media, middleware::metrics_middleware, migration};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Media items
        .route("/media", post(media::create_media))
        .route("/media", get(media::list_media))
        .route("/media/{id}", get(media::get_media))
        .route("/media/{id}/status", get(media::get_status))
        .route("/media/{id}/process", post(media::process_media))
        .route("/media/{id}/retry", post(media::retry_media))
        // Batches
        .route("/batch/run", post(batch::run_batch))
        // Migration
        .route("/migration/start", post(migration::start))
        .route("/migration/stop", post(migration::stop))
        .route("/migration/status", get(migration::get_status))
        .with_state(Arc::clone(&state));

    Router::new()
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
