//! In-memory status store for testing.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::media::{
    CreateMediaRequest, DerivedArtifacts, MediaFilter, MediaItem, MediaStore, ProcessingStatus,
    StatusUpdate, StoreError,
};

/// In-memory implementation of the MediaStore trait.
///
/// Provides controllable behavior for testing:
/// - Toggle availability to simulate a lost database
/// - Record the status history of every item
/// - Insert items in any state without going through the lifecycle
///
/// Items keep insertion order, which stands in for creation order.
#[derive(Debug, Default)]
pub struct MockMediaStore {
    items: RwLock<Vec<MediaItem>>,
    history: RwLock<HashMap<String, Vec<ProcessingStatus>>>,
    unavailable: AtomicBool,
    update_calls: AtomicUsize,
}

impl MockMediaStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with `Unavailable` until cleared.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Insert an item as-is, bypassing lifecycle checks.
    pub fn insert(&self, item: MediaItem) {
        self.write_history()
            .insert(item.id.clone(), vec![item.status]);
        self.write_items().push(item);
    }

    /// Insert a completed item whose artifacts are in `format`.
    pub fn insert_completed(&self, source_url: &str, format: &str) -> MediaItem {
        let now = Utc::now();
        let id = uuid::Uuid::new_v4().to_string();
        let item = MediaItem {
            artifacts: DerivedArtifacts {
                thumbnail_url: Some(format!("https://cdn.mock/{}/thumb.{}", id, format)),
                preview_url: Some(format!("https://cdn.mock/{}/preview.{}", id, format)),
                format: Some(format.to_string()),
            },
            id,
            source_url: source_url.to_string(),
            title: None,
            status: ProcessingStatus::Completed,
            last_error: None,
            retry_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.insert(item.clone());
        item
    }

    /// Every status an item has been written with, starting at its initial one.
    pub fn status_history(&self, id: &str) -> Vec<ProcessingStatus> {
        self.history
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of successful `update_status` calls.
    pub fn update_count(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// Snapshot of every item.
    pub fn snapshot(&self) -> Vec<MediaItem> {
        self.items
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("mock store offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn write_items(&self) -> std::sync::RwLockWriteGuard<'_, Vec<MediaItem>> {
        self.items.write().unwrap_or_else(|e| e.into_inner())
    }

    fn write_history(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Vec<ProcessingStatus>>> {
        self.history.write().unwrap_or_else(|e| e.into_inner())
    }

    fn filtered(&self, status: Option<ProcessingStatus>) -> Vec<MediaItem> {
        self.items
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|item| status.is_none_or(|s| item.status == s))
            .cloned()
            .collect()
    }
}

impl MediaStore for MockMediaStore {
    fn create(&self, request: CreateMediaRequest) -> Result<MediaItem, StoreError> {
        self.check_available()?;
        let now = Utc::now();
        let item = MediaItem {
            id: uuid::Uuid::new_v4().to_string(),
            source_url: request.source_url,
            title: request.title,
            artifacts: DerivedArtifacts::default(),
            status: ProcessingStatus::Pending,
            last_error: None,
            retry_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.insert(item.clone());
        Ok(item)
    }

    fn get(&self, id: &str) -> Result<Option<MediaItem>, StoreError> {
        self.check_available()?;
        Ok(self
            .items
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|item| item.id == id)
            .cloned())
    }

    fn get_pending(&self, limit: usize) -> Result<Vec<MediaItem>, StoreError> {
        self.check_available()?;
        let mut items = self.filtered(Some(ProcessingStatus::Pending));
        items.truncate(limit);
        Ok(items)
    }

    fn list_all(&self) -> Result<Vec<MediaItem>, StoreError> {
        self.check_available()?;
        Ok(self.filtered(None))
    }

    fn list(&self, filter: &MediaFilter) -> Result<Vec<MediaItem>, StoreError> {
        self.check_available()?;
        Ok(self
            .filtered(filter.status)
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    fn count(&self, filter: &MediaFilter) -> Result<i64, StoreError> {
        self.check_available()?;
        Ok(self.filtered(filter.status).len() as i64)
    }

    fn update_status(&self, id: &str, update: StatusUpdate) -> Result<MediaItem, StoreError> {
        self.check_available()?;

        let mut items = self.write_items();
        let item = items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if !item.status.can_transition_to(update.status) {
            return Err(StoreError::InvalidTransition {
                media_id: id.to_string(),
                from: item.status,
                to: update.status,
            });
        }

        item.status = update.status;
        if let Some(artifacts) = update.artifacts {
            item.artifacts = artifacts;
        }
        item.last_error = update.last_error;
        if update.count_retry {
            item.retry_count += 1;
        }
        item.updated_at = Utc::now();
        let updated = item.clone();
        drop(items);

        self.write_history()
            .entry(id.to_string())
            .or_default()
            .push(updated.status);
        self.update_calls.fetch_add(1, Ordering::SeqCst);

        Ok(updated)
    }
}
