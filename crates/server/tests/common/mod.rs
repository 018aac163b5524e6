//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! backed by a real SQLite store in a temp directory and a mock transcode
//! worker, so the whole request path runs without external infrastructure.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use reelforge_core::config::{DatabaseConfig, ServerConfig};
use reelforge_core::{
    testing::MockTranscodeWorker, BatchScheduler, Clock, Config, ItemProcessor, MediaStore,
    MigrationConfig, MigrationController, ProcessingService, ProcessorConfig, SchedulerConfig,
    SqliteMediaStore, TokioClock, TranscodeWorker,
};

/// Re-export fixtures for test convenience
pub use reelforge_core::testing::fixtures;

/// Test fixture for API testing with a mock worker.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_register_media() {
///     let fixture = TestFixture::new();
///
///     let response = fixture.post("/api/v1/media", json!({
///         "source_url": "https://uploads.test/a.mp4"
///     })).await;
///
///     assert_eq!(response.status, 201);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Status store shared with the router
    pub store: Arc<dyn MediaStore>,
    /// Mock worker - script failures, latency and hooks
    pub worker: Arc<MockTranscodeWorker>,
    /// Processing facade shared with the router
    pub service: ProcessingService,
    /// Temporary directory for the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with default settings.
    pub fn new() -> Self {
        Self::with_config(TestConfig::default())
    }

    /// Create a test fixture with custom configuration.
    pub fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            processor: ProcessorConfig {
                max_retries: test_config.max_retries,
                ..Default::default()
            },
            scheduler: SchedulerConfig {
                pacing_ms: 0,
                batch_size: test_config.batch_size,
                ..Default::default()
            },
            migration: MigrationConfig {
                pacing_ms: 0,
                ..Default::default()
            },
            ..Default::default()
        };

        let store: Arc<dyn MediaStore> =
            Arc::new(SqliteMediaStore::new(&db_path).expect("Failed to create media store"));
        let worker = Arc::new(MockTranscodeWorker::new());
        let clock: Arc<dyn Clock> = Arc::new(TokioClock);

        let processor = Arc::new(ItemProcessor::new(
            config.processor.clone(),
            Arc::clone(&store),
            Arc::clone(&worker) as Arc<dyn TranscodeWorker>,
        ));
        let scheduler = Arc::new(BatchScheduler::new(
            config.scheduler.clone(),
            Arc::clone(&processor),
            Arc::clone(&clock),
        ));
        let migration = Arc::new(MigrationController::new(
            config.migration.clone(),
            Arc::clone(&processor),
            clock,
        ));
        let service = ProcessingService::new(Arc::clone(&store), processor, scheduler, migration);

        let state = Arc::new(reelforge_server::state::AppState::new(
            config,
            service.clone(),
        ));
        let router = reelforge_server::api::create_router(state);

        Self {
            router,
            store,
            worker,
            service,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Register a media item through the API and return its ID.
    pub async fn register(&self, source_url: &str) -> String {
        let response = self
            .post(
                "/api/v1/media",
                serde_json::json!({ "source_url": source_url }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
        response.body["id"]
            .as_str()
            .expect("created media has an id")
            .to_string()
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Retry cap for failed items (0 = unlimited)
    pub max_retries: u32,
    /// Default batch size for `/batch/run`
    pub batch_size: usize,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            batch_size: 5,
        }
    }
}

impl TestConfig {
    /// Create config with the given retry cap.
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
