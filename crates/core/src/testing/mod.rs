//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the external collaborators
//! (status store, transcode worker) and a virtual clock, allowing the
//! processor, scheduler and migration controller to be tested without a
//! database, a worker or real pacing delays.
//!
//! # Example
//!
//! ```rust,ignore
//! use reelforge_core::testing::{fixtures, ManualClock, MockMediaStore, MockTranscodeWorker};
//!
//! let store = Arc::new(MockMediaStore::new());
//! let worker = Arc::new(MockTranscodeWorker::new());
//! let clock = Arc::new(ManualClock::new());
//!
//! fixtures::seed_pending(store.as_ref(), 10);
//! worker.set_latency(Duration::from_millis(10)).await;
//! ```

mod manual_clock;
mod mock_store;
mod mock_worker;

pub mod fixtures;

pub use manual_clock::ManualClock;
pub use mock_store::MockMediaStore;
pub use mock_worker::{MockTranscodeWorker, RecordedInvocation};
