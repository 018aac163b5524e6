//! Item processing and batch scheduling.
//!
//! [`ItemProcessor`] drives a single media item through
//! `Pending/Failed -> Processing -> Completed/Failed`, persisting
//! `Processing` before the transcode worker is called and bounding each
//! worker call with a timeout so no item stays in `Processing`.
//!
//! [`BatchScheduler`] selects the oldest pending items and feeds them to the
//! processor one at a time, paced by a [`crate::pacing::Pacer`].

mod batch;
mod config;
mod item;
mod types;

pub use batch::BatchScheduler;
pub use config::{ProcessorConfig, SchedulerConfig};
pub use item::ItemProcessor;
pub use types::{BatchReport, ProcessOutcome, ProcessorError};
