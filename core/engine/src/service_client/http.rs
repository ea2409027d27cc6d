//! reqwest implementation of the service adapters.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use super::types::{
    CountsClient, ErrorBody, InferenceClient, PredictRequest, PredictResponse, TrainingClient,
    UploadClient, UploadRequest,
};
use crate::config_manager::ServiceConfig;
use crate::error::{CaptureError, CaptureResult};
use crate::types::{Ack, CountsSnapshot, Label, LandmarkFrame, PredictionResult};

/// HTTP/JSON client for the landmark service.
///
/// One `reqwest::Client` backs all four adapters, so clones share a
/// connection pool.
#[derive(Clone)]
pub struct HttpServiceClient {
    http: Client,
    base_url: String,
}

impl HttpServiceClient {
    /// # Arguments
    /// * `base_url` - service root, e.g. `http://127.0.0.1:5000`
    /// * `timeout` - per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> CaptureResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CaptureError::config(format!("failed to create HTTP client: {}", e)))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    /// Builds the client from `[service]`: `base_url` and `timeout_ms`.
    pub fn from_config(config: &ServiceConfig) -> CaptureResult<Self> {
        Self::new(
            config.base_url.clone(),
            Duration::from_millis(config.timeout_ms),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Turns a non-2xx response into an error. An `{error}` body is passed through
/// verbatim; anything else is reported with the status code.
async fn check_status(response: Response, operation: &str) -> CaptureResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody { error }) => {
            tracing::warn!(operation, %status, error = %error, "service rejected request");
            Err(CaptureError::application(error))
        }
        Err(_) => {
            tracing::warn!(operation, %status, "service returned an error without a message");
            Err(CaptureError::transport(format!(
                "{} failed with HTTP {}",
                operation, status
            )))
        }
    }
}

async fn read_json<T: DeserializeOwned>(response: Response, operation: &str) -> CaptureResult<T> {
    let body = response
        .text()
        .await
        .map_err(|e| CaptureError::transport(format!("{} response unreadable: {}", operation, e)))?;
    serde_json::from_str(&body)
        .map_err(|e| CaptureError::malformed(format!("{} response malformed: {}", operation, e)))
}

fn send_error(operation: &str, e: reqwest::Error) -> CaptureError {
    CaptureError::transport(format!("{} request failed: {}", operation, e))
}

#[async_trait]
impl InferenceClient for HttpServiceClient {
    async fn predict(&self, frame: &LandmarkFrame) -> CaptureResult<PredictionResult> {
        let request = PredictRequest {
            landmarks: frame.points(),
        };
        let response = self
            .http
            .post(self.url("/predict_landmarks"))
            .json(&request)
            .send()
            .await
            .map_err(|e| send_error("predict", e))?;
        let response = check_status(response, "predict").await?;
        let body: PredictResponse = read_json(response, "predict").await?;

        let label = body.prediction.parse::<Label>().map_err(|_| {
            CaptureError::malformed(format!("predict returned unknown label '{}'", body.prediction))
        })?;
        let result = PredictionResult::new(label, body.confidence)?;
        tracing::debug!(
            frame_ts = frame.timestamp_ms(),
            label = %result.label,
            confidence = result.confidence,
            "prediction received"
        );
        Ok(result)
    }
}

#[async_trait]
impl UploadClient for HttpServiceClient {
    async fn upload(&self, label: Label, frame: &LandmarkFrame) -> CaptureResult<Ack> {
        let request = UploadRequest {
            label,
            landmarks: frame.points(),
        };
        let response = self
            .http
            .post(self.url("/upload_landmarks"))
            .json(&request)
            .send()
            .await
            .map_err(|e| send_error("upload", e))?;
        check_status(response, "upload").await?;
        Ok(Ack)
    }
}

#[async_trait]
impl TrainingClient for HttpServiceClient {
    async fn train(&self) -> CaptureResult<Ack> {
        tracing::info!(url = %self.url("/train_landmarks"), "requesting training");
        let response = self
            .http
            .post(self.url("/train_landmarks"))
            .send()
            .await
            .map_err(|e| send_error("train", e))?;
        check_status(response, "train").await?;
        Ok(Ack)
    }
}

#[async_trait]
impl CountsClient for HttpServiceClient {
    async fn fetch_counts(&self) -> CaptureResult<CountsSnapshot> {
        let response = self
            .http
            .get(self.url("/count"))
            .send()
            .await
            .map_err(|e| send_error("count", e))?;
        let response = check_status(response, "count").await?;
        let raw: BTreeMap<String, u32> = read_json(response, "count").await?;
        Ok(CountsSnapshot::from_wire(raw))
    }
}
