//! Wiring of configuration, service adapters and the event bus.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::collection::CollectionSession;
use crate::config_manager::CaptureConfig;
use crate::dispatch::BoundedQueue;
use crate::error::{CaptureError, CaptureResult};
use crate::event_bus::EventBus;
use crate::latest_frame::latest_frame_slot;
use crate::prediction_board::PredictionBoard;
use crate::service_client::{
    CountsClient, HttpServiceClient, InferenceClient, TrainingClient, UploadClient,
};
use crate::throttle::PredictionThrottler;
use crate::types::CountsSnapshot;

use super::core::{spawn_predict_workers, spawn_upload_workers, CaptureController};

/// Collects the controller's collaborators. The event bus and all four
/// service adapters are required; [`Self::http_service`] supplies the adapters
/// in one call.
pub struct CaptureControllerBuilder {
    config: CaptureConfig,
    event_bus: Option<Arc<dyn EventBus>>,
    inference: Option<Arc<dyn InferenceClient>>,
    uploads: Option<Arc<dyn UploadClient>>,
    training: Option<Arc<dyn TrainingClient>>,
    counts: Option<Arc<dyn CountsClient>>,
    // Only known when the HTTP adapters are used; enables the startup probe.
    service_url: Option<String>,
}

impl CaptureControllerBuilder {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            event_bus: None,
            inference: None,
            uploads: None,
            training: None,
            counts: None,
            service_url: None,
        }
    }

    pub fn event_bus(mut self, event_bus: Arc<dyn EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn inference(mut self, client: Arc<dyn InferenceClient>) -> Self {
        self.inference = Some(client);
        self
    }

    pub fn uploads(mut self, client: Arc<dyn UploadClient>) -> Self {
        self.uploads = Some(client);
        self
    }

    pub fn training(mut self, client: Arc<dyn TrainingClient>) -> Self {
        self.training = Some(client);
        self
    }

    pub fn counts(mut self, client: Arc<dyn CountsClient>) -> Self {
        self.counts = Some(client);
        self
    }

    /// Uses one HTTP client, built from `[service]`, for all four adapters.
    pub fn http_service(mut self) -> CaptureResult<Self> {
        let client = Arc::new(HttpServiceClient::from_config(&self.config.service)?);
        self.service_url = Some(client.base_url().to_string());
        self.inference = Some(client.clone());
        self.uploads = Some(client.clone());
        self.training = Some(client.clone());
        self.counts = Some(client);
        Ok(self)
    }

    /// Builds the controller and starts its dispatch workers, so it must be
    /// called inside a tokio runtime.
    pub fn build(self) -> CaptureResult<CaptureController> {
        self.config.validate()?;
        let event_bus = self
            .event_bus
            .ok_or_else(|| CaptureError::config("event_bus is missing"))?;
        let inference = self
            .inference
            .ok_or_else(|| CaptureError::config("inference client is missing"))?;
        let uploads = self
            .uploads
            .ok_or_else(|| CaptureError::config("upload client is missing"))?;
        let training = self
            .training
            .ok_or_else(|| CaptureError::config("training client is missing"))?;
        let counts_client = self
            .counts
            .ok_or_else(|| CaptureError::config("counts client is missing"))?;

        let config = self.config;
        let dispatch = &config.dispatch;
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        let predict_queue = Arc::new(BoundedQueue::new(
            "predict",
            dispatch.predict_queue_capacity,
            dispatch.overflow,
        ));
        let upload_queue = Arc::new(BoundedQueue::new(
            "upload",
            dispatch.upload_queue_capacity,
            dispatch.overflow,
        ));

        let mut workers = spawn_predict_workers(
            Arc::clone(&predict_queue),
            dispatch.predict_workers,
            inference,
            completions_tx.clone(),
        );
        workers.extend(spawn_upload_workers(
            Arc::clone(&upload_queue),
            dispatch.upload_workers,
            uploads,
            completions_tx.clone(),
        ));

        let (latest, _) = latest_frame_slot();

        Ok(CaptureController {
            throttler: PredictionThrottler::new(config.throttle.interval_ms),
            session: CollectionSession::new(
                config.collection.quota,
                config.collection.quota_policy,
            ),
            counts: CountsSnapshot::default(),
            board: PredictionBoard::new(config.predictions.discard_stale),
            latest,
            config,
            event_bus,
            training,
            counts_client,
            service_url: self.service_url,
            predict_queue,
            upload_queue,
            workers,
            tasks: JoinSet::new(),
            completions_tx,
            completions_rx,
        })
    }
}
