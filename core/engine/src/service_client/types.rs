//! Adapter traits and the JSON bodies exchanged with the landmark service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CaptureResult;
use crate::types::{Ack, CountsSnapshot, Label, LandmarkFrame, Point3D, PredictionResult};

/// Body of `POST /upload_landmarks`.
#[derive(Debug, Clone, Serialize)]
pub struct UploadRequest<'a> {
    pub label: Label,
    pub landmarks: &'a [Point3D],
}

/// Body of `POST /predict_landmarks`.
#[derive(Debug, Clone, Serialize)]
pub struct PredictRequest<'a> {
    pub landmarks: &'a [Point3D],
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictResponse {
    pub prediction: String,
    pub confidence: f32,
}

/// Error body of any non-2xx response.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn predict(&self, frame: &LandmarkFrame) -> CaptureResult<PredictionResult>;
}

#[async_trait]
pub trait UploadClient: Send + Sync {
    /// Best effort. A repeated call stores the sample twice.
    async fn upload(&self, label: Label, frame: &LandmarkFrame) -> CaptureResult<Ack>;
}

#[async_trait]
pub trait TrainingClient: Send + Sync {
    async fn train(&self) -> CaptureResult<Ack>;
}

#[async_trait]
pub trait CountsClient: Send + Sync {
    async fn fetch_counts(&self) -> CaptureResult<CountsSnapshot>;
}
