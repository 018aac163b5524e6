//! Media catalog: items, their processing status, and the status store.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteMediaStore;
pub use store::{MediaFilter, MediaStore, StoreError};
pub use types::{CreateMediaRequest, DerivedArtifacts, MediaItem, ProcessingStatus, StatusUpdate};
