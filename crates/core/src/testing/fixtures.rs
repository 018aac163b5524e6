//! Test fixtures and helper functions.

use crate::media::{
    CreateMediaRequest, DerivedArtifacts, MediaItem, MediaStore, StatusUpdate,
};

/// A registration request with a predictable source URL.
pub fn media_request(n: usize) -> CreateMediaRequest {
    CreateMediaRequest {
        source_url: format!("https://uploads.example.com/video-{:03}.mp4", n),
        title: Some(format!("Video {}", n)),
    }
}

/// Artifacts in `format` for the given item.
pub fn artifacts(media_id: &str, format: &str) -> DerivedArtifacts {
    DerivedArtifacts {
        thumbnail_url: Some(format!("https://cdn.example.com/{}/thumb.{}", media_id, format)),
        preview_url: Some(format!("https://cdn.example.com/{}/preview.{}", media_id, format)),
        format: Some(format.to_string()),
    }
}

/// Register `count` pending items, oldest first.
///
/// Panics if the store rejects a write.
pub fn seed_pending(store: &dyn MediaStore, count: usize) -> Vec<MediaItem> {
    (0..count)
        .map(|n| store.create(media_request(n)).expect("seed pending item"))
        .collect()
}

/// Register an item and drive it to `Completed` with artifacts in `format`.
///
/// Panics if the store rejects a write.
pub fn seed_completed(store: &dyn MediaStore, n: usize, format: &str) -> MediaItem {
    let item = store.create(media_request(n)).expect("seed item");
    store
        .update_status(&item.id, StatusUpdate::processing())
        .expect("mark processing");
    store
        .update_status(&item.id, StatusUpdate::completed(artifacts(&item.id, format)))
        .expect("mark completed")
}

/// Register an item and drive it to `Failed` with `error`.
///
/// Panics if the store rejects a write.
pub fn seed_failed(store: &dyn MediaStore, n: usize, error: &str) -> MediaItem {
    let item = store.create(media_request(n)).expect("seed item");
    store
        .update_status(&item.id, StatusUpdate::processing())
        .expect("mark processing");
    store
        .update_status(&item.id, StatusUpdate::failed(error))
        .expect("mark failed")
}
