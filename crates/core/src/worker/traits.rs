//! Trait definition for the transcode worker client.

use async_trait::async_trait;

use super::error::TranscodeError;
use super::types::{TranscodeOutput, TranscodeRequest};

/// External capability that turns a source video into browsing artifacts.
#[async_trait]
pub trait TranscodeWorker: Send + Sync {
    /// Returns the name of this worker implementation.
    fn name(&self) -> &str;

    /// Generate the requested artifacts for one media item.
    async fn invoke(&self, request: TranscodeRequest) -> Result<TranscodeOutput, TranscodeError>;

    /// Check that the worker is reachable.
    async fn health_check(&self) -> Result<(), TranscodeError> {
        Ok(())
    }
}
