//! Transcode worker client.
//!
//! The actual decode/encode work happens in an external service. This module
//! defines the [`TranscodeWorker`] seam and an HTTP implementation of it.
//!
//! # Example
//!
//! ```ignore
//! use reelforge_core::worker::{HttpTranscodeWorker, TranscodeRequest, TranscodeOptions, WorkerConfig};
//!
//! let worker = HttpTranscodeWorker::new(WorkerConfig::default())?;
//! let output = worker
//!     .invoke(TranscodeRequest {
//!         media_id: "abc".to_string(),
//!         source_url: "https://uploads.example.com/abc.mp4".to_string(),
//!         options: TranscodeOptions::default(),
//!     })
//!     .await?;
//! println!("thumbnail at {:?}", output.thumbnail_url);
//! ```

mod config;
mod error;
mod http;
mod traits;
mod types;

pub use config::WorkerConfig;
pub use error::TranscodeError;
pub use http::HttpTranscodeWorker;
pub use traits::TranscodeWorker;
pub use types::{TranscodeOptions, TranscodeOutput, TranscodeRequest};
