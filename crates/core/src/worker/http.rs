//! HTTP transcode worker client.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::{TranscodeError, TranscodeOutput, TranscodeRequest, TranscodeWorker, WorkerConfig};

/// Transcode worker reached over HTTP.
///
/// Posts the request as JSON to `{url}/transcode` and expects
/// `{"preview_url": ..., "thumbnail_url": ...}` back.
pub struct HttpTranscodeWorker {
    client: Client,
    config: WorkerConfig,
}

impl HttpTranscodeWorker {
    /// Create a new client with the given configuration.
    pub fn new(config: WorkerConfig) -> Result<Self, TranscodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TranscodeError::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.url.trim_end_matches('/'), path)
    }

    fn map_send_error(&self, e: reqwest::Error) -> TranscodeError {
        if e.is_timeout() {
            TranscodeError::Timeout {
                timeout_ms: self.config.timeout_secs.saturating_mul(1000),
            }
        } else {
            TranscodeError::Connection(e.to_string())
        }
    }
}

#[async_trait]
impl TranscodeWorker for HttpTranscodeWorker {
    fn name(&self) -> &str {
        "http"
    }

    async fn invoke(&self, request: TranscodeRequest) -> Result<TranscodeOutput, TranscodeError> {
        debug!(media_id = %request.media_id, "Invoking transcode worker");

        let mut builder = self.client.post(self.endpoint("transcode")).json(&request);
        if let Some(ref api_key) = self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await.map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TranscodeError::rejected(
                status.as_u16(),
                body.chars().take(200).collect::<String>(),
            ));
        }

        let output: TranscodeOutput = response
            .json()
            .await
            .map_err(|e| TranscodeError::invalid_response(e.to_string()))?;

        if output.preview_url.is_none() && output.thumbnail_url.is_none() {
            return Err(TranscodeError::invalid_response(
                "worker returned no artifacts",
            ));
        }

        Ok(output)
    }

    async fn health_check(&self) -> Result<(), TranscodeError> {
        let response = self
            .client
            .get(self.endpoint("health"))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(TranscodeError::rejected(
                response.status().as_u16(),
                "health check failed",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::TranscodeOptions;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn spawn_worker(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn request() -> TranscodeRequest {
        TranscodeRequest {
            media_id: "m-1".to_string(),
            source_url: "https://uploads.example.com/m-1.mp4".to_string(),
            options: TranscodeOptions::default(),
        }
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let worker = HttpTranscodeWorker::new(WorkerConfig {
            url: "http://worker:9400/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(worker.endpoint("transcode"), "http://worker:9400/transcode");
    }

    #[tokio::test]
    async fn test_invoke_success() {
        let router = Router::new().route(
            "/transcode",
            post(|Json(body): Json<Value>| async move {
                let id = body["media_id"].as_str().unwrap_or_default().to_string();
                Json(json!({
                    "preview_url": format!("https://cdn/{}/preview.webp", id),
                    "thumbnail_url": format!("https://cdn/{}/thumb.webp", id),
                }))
            }),
        );
        let url = spawn_worker(router).await;

        let worker = HttpTranscodeWorker::new(WorkerConfig {
            url,
            ..Default::default()
        })
        .unwrap();

        let output = worker.invoke(request()).await.unwrap();
        assert_eq!(
            output.thumbnail_url.as_deref(),
            Some("https://cdn/m-1/thumb.webp")
        );
        assert_eq!(
            output.preview_url.as_deref(),
            Some("https://cdn/m-1/preview.webp")
        );
    }

    #[tokio::test]
    async fn test_invoke_maps_rejection() {
        let router = Router::new().route(
            "/transcode",
            post(|| async { (StatusCode::UNPROCESSABLE_ENTITY, "corrupt source") }),
        );
        let url = spawn_worker(router).await;

        let worker = HttpTranscodeWorker::new(WorkerConfig {
            url,
            ..Default::default()
        })
        .unwrap();

        let err = worker.invoke(request()).await.unwrap_err();
        assert_eq!(err, TranscodeError::rejected(422, "corrupt source"));
    }

    #[tokio::test]
    async fn test_invoke_rejects_empty_output() {
        let router = Router::new().route("/transcode", post(|| async { Json(json!({})) }));
        let url = spawn_worker(router).await;

        let worker = HttpTranscodeWorker::new(WorkerConfig {
            url,
            ..Default::default()
        })
        .unwrap();

        let err = worker.invoke(request()).await.unwrap_err();
        assert!(matches!(err, TranscodeError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn test_invoke_unreachable_worker() {
        let worker = HttpTranscodeWorker::new(WorkerConfig {
            url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 2,
            ..Default::default()
        })
        .unwrap();

        let err = worker.invoke(request()).await.unwrap_err();
        assert!(err.is_retryable());
    }
}
