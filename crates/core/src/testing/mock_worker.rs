//! Mock transcode worker for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::worker::{TranscodeError, TranscodeOutput, TranscodeRequest, TranscodeWorker};

/// A recorded worker invocation for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedInvocation {
    /// The request that was made.
    pub request: TranscodeRequest,
    /// When the request was made.
    pub timestamp: chrono::DateTime<Utc>,
}

type InvokeHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Mock implementation of the TranscodeWorker trait.
///
/// Provides controllable behavior for testing:
/// - Track invocations for assertions
/// - Script failures per source URL or media ID
/// - Simulate worker latency
/// - Run a callback when a given item reaches the worker
///
/// Successful calls return URLs derived from the media ID and target format.
///
/// # Example
///
/// ```rust,ignore
/// let worker = MockTranscodeWorker::new();
///
/// worker.fail_source("https://uploads/broken.mp4", TranscodeError::rejected(422, "corrupt")).await;
/// worker.set_latency(Duration::from_millis(50)).await;
///
/// // ... run the processor ...
///
/// assert_eq!(worker.invocation_count().await, 3);
/// ```
pub struct MockTranscodeWorker {
    /// Recorded invoke calls.
    invocations: Arc<RwLock<Vec<RecordedInvocation>>>,
    /// Scripted failures keyed by source URL or media ID.
    failures: Arc<RwLock<HashMap<String, TranscodeError>>>,
    /// If set, the next invocation will fail with this error.
    next_error: Arc<RwLock<Option<TranscodeError>>>,
    /// Simulated processing time.
    latency: Arc<RwLock<Option<Duration>>>,
    /// Called with the media ID at the start of every invocation.
    invoke_hook: Arc<RwLock<Option<InvokeHook>>>,
    /// Whether health checks pass.
    healthy: Arc<RwLock<bool>>,
    /// Base URL for generated artifact URLs.
    cdn_base: String,
}

impl Default for MockTranscodeWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockTranscodeWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTranscodeWorker")
            .field("cdn_base", &self.cdn_base)
            .finish_non_exhaustive()
    }
}

impl MockTranscodeWorker {
    /// Create a new mock worker.
    pub fn new() -> Self {
        Self {
            invocations: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            next_error: Arc::new(RwLock::new(None)),
            latency: Arc::new(RwLock::new(None)),
            invoke_hook: Arc::new(RwLock::new(None)),
            healthy: Arc::new(RwLock::new(true)),
            cdn_base: "https://cdn.mock".to_string(),
        }
    }

    /// Get all recorded invocations.
    pub async fn recorded_invocations(&self) -> Vec<RecordedInvocation> {
        self.invocations.read().await.clone()
    }

    /// Number of invocations so far.
    pub async fn invocation_count(&self) -> usize {
        self.invocations.read().await.len()
    }

    /// Clear recorded invocations.
    pub async fn clear_recorded(&self) {
        self.invocations.write().await.clear();
    }

    /// Fail every invocation for this source URL.
    pub async fn fail_source(&self, source_url: &str, error: TranscodeError) {
        self.failures
            .write()
            .await
            .insert(source_url.to_string(), error);
    }

    /// Fail every invocation for this media ID.
    pub async fn fail_media(&self, media_id: &str, error: TranscodeError) {
        self.failures
            .write()
            .await
            .insert(media_id.to_string(), error);
    }

    /// Remove all scripted failures.
    pub async fn clear_failures(&self) {
        self.failures.write().await.clear();
    }

    /// Configure the next invocation to fail with the given error.
    pub async fn set_next_error(&self, error: TranscodeError) {
        *self.next_error.write().await = Some(error);
    }

    /// Simulate processing time on every invocation.
    pub async fn set_latency(&self, latency: Duration) {
        *self.latency.write().await = Some(latency);
    }

    /// Run `hook` with the media ID whenever an invocation starts.
    pub async fn set_invoke_hook<F>(&self, hook: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        *self.invoke_hook.write().await = Some(Arc::new(hook));
    }

    /// Make health checks fail or pass.
    pub async fn set_healthy(&self, healthy: bool) {
        *self.healthy.write().await = healthy;
    }

    async fn scripted_error(&self, request: &TranscodeRequest) -> Option<TranscodeError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Some(err);
        }
        let failures = self.failures.read().await;
        failures
            .get(&request.media_id)
            .or_else(|| failures.get(&request.source_url))
            .cloned()
    }
}

#[async_trait]
impl TranscodeWorker for MockTranscodeWorker {
    fn name(&self) -> &str {
        "mock"
    }

    async fn invoke(&self, request: TranscodeRequest) -> Result<TranscodeOutput, TranscodeError> {
        self.invocations.write().await.push(RecordedInvocation {
            request: request.clone(),
            timestamp: Utc::now(),
        });

        let hook = self.invoke_hook.read().await.clone();
        if let Some(hook) = hook {
            hook(&request.media_id);
        }

        let latency = *self.latency.read().await;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if let Some(err) = self.scripted_error(&request).await {
            return Err(err);
        }

        let format = &request.options.target_format;
        Ok(TranscodeOutput {
            thumbnail_url: request.options.generate_static.then(|| {
                format!("{}/{}/thumb.{}", self.cdn_base, request.media_id, format)
            }),
            preview_url: request.options.generate_animated.then(|| {
                format!("{}/{}/preview.{}", self.cdn_base, request.media_id, format)
            }),
        })
    }

    async fn health_check(&self) -> Result<(), TranscodeError> {
        if *self.healthy.read().await {
            Ok(())
        } else {
            Err(TranscodeError::Connection("mock worker unhealthy".to_string()))
        }
    }
}
