//! Status, progress, and prediction events for whatever front end observes
//! the capture controller.
//!
//! Each event replaces the observer's current value of that kind; nothing is
//! accumulated here.

mod channel;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::CaptureResult;
use crate::types::{CountsSnapshot, Label};

pub use channel::ChannelEventBus;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatusUpdate {
    Ready,
    Collecting { label: Label },
    Stopped,
    /// A session refused to start or to record because the label is full.
    QuotaReached { label: Label },
    Training,
    Trained,
    /// Request failure. `message` is shown as is.
    Error { message: String },
}

impl StatusUpdate {
    pub fn text(&self) -> String {
        match self {
            StatusUpdate::Ready => "ready".to_string(),
            StatusUpdate::Collecting { label } => format!("collecting {}", label),
            StatusUpdate::Stopped => "stopped".to_string(),
            StatusUpdate::QuotaReached { label } => format!("quota reached for {}", label),
            StatusUpdate::Training => "training".to_string(),
            StatusUpdate::Trained => "trained".to_string(),
            StatusUpdate::Error { message } => message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CaptureEvent {
    Status(StatusUpdate),
    /// Samples recorded in the running session; `count` 0 with no label once stopped.
    Progress {
        label: Option<Label>,
        count: u32,
        quota: u32,
    },
    Prediction {
        frame_timestamp_ms: u64,
        label: Label,
        confidence: f32,
    },
    Counts(CountsSnapshot),
}

#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, event: CaptureEvent) -> CaptureResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_tags() {
        let json = serde_json::to_value(CaptureEvent::Status(StatusUpdate::Collecting {
            label: Label::A,
        }))
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"event": "status", "status": "collecting", "label": "A"})
        );

        let json = serde_json::to_value(CaptureEvent::Progress {
            label: Some(Label::E),
            count: 3,
            quota: 100,
        })
        .unwrap();
        assert_eq!(json["count"], 3);
        assert_eq!(json["label"], "E");
    }

    #[test]
    fn error_text_is_the_message() {
        let status = StatusUpdate::Error {
            message: "insufficient data".to_string(),
        };
        assert_eq!(status.text(), "insufficient data");
    }
}
