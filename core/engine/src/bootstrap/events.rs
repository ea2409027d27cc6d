//! Event publishing helpers.

use crate::error::CaptureResult;
use crate::event_bus::{CaptureEvent, StatusUpdate};
use crate::types::{Label, PredictionResult};

use super::core::CaptureController;

impl CaptureController {
    pub(crate) async fn publish_status(&self, status: StatusUpdate) -> CaptureResult<()> {
        self.event_bus.publish(CaptureEvent::Status(status)).await
    }

    pub(crate) async fn publish_error(&self, message: impl Into<String>) -> CaptureResult<()> {
        self.publish_status(StatusUpdate::Error {
            message: message.into(),
        })
        .await
    }

    pub(crate) async fn publish_progress(
        &self,
        label: Option<Label>,
        count: u32,
    ) -> CaptureResult<()> {
        self.event_bus
            .publish(CaptureEvent::Progress {
                label,
                count,
                quota: self.session.quota(),
            })
            .await
    }

    pub(crate) async fn publish_prediction(
        &self,
        frame_timestamp_ms: u64,
        result: &PredictionResult,
    ) -> CaptureResult<()> {
        self.event_bus
            .publish(CaptureEvent::Prediction {
                frame_timestamp_ms,
                label: result.label,
                confidence: result.confidence,
            })
            .await
    }

    pub(crate) async fn publish_counts(&self) -> CaptureResult<()> {
        self.event_bus
            .publish(CaptureEvent::Counts(self.counts.clone()))
            .await
    }
}
