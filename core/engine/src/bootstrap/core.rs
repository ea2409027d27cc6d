//! Controller state, the inputs it accepts and the dispatch workers it owns.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle, JoinSet};

use crate::collection::CollectionSession;
use crate::config_manager::CaptureConfig;
use crate::dispatch::BoundedQueue;
use crate::error::CaptureResult;
use crate::event_bus::EventBus;
use crate::latest_frame::{LatestFrameReader, LatestFrameWriter};
use crate::prediction_board::PredictionBoard;
use crate::service_client::{CountsClient, InferenceClient, TrainingClient, UploadClient};
use crate::throttle::PredictionThrottler;
use crate::types::{Ack, CountsSnapshot, Label, LandmarkFrame, PredictionResult};

/// One output of the external hand detector.
#[derive(Debug, Clone)]
pub enum DetectorOutput {
    Hand(LandmarkFrame),
    /// No hand in view for this camera frame.
    NoHand,
}

/// Requests from the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    StartCollection(Label),
    StopCollection,
    Train,
    RefreshCounts,
}

/// Everything the controller consumes, in arrival order.
#[derive(Debug, Clone)]
pub enum Input {
    Detector(DetectorOutput),
    Command(Command),
}

impl From<DetectorOutput> for Input {
    fn from(output: DetectorOutput) -> Self {
        Input::Detector(output)
    }
}

impl From<Command> for Input {
    fn from(command: Command) -> Self {
        Input::Command(command)
    }
}

/// Result of a network call, delivered back to the controller task.
#[derive(Debug)]
pub enum Completion {
    Prediction {
        frame_timestamp_ms: u64,
        result: CaptureResult<PredictionResult>,
    },
    Upload {
        label: Label,
        frame_timestamp_ms: u64,
        result: CaptureResult<Ack>,
    },
    Training(CaptureResult<Ack>),
    Counts(CaptureResult<CountsSnapshot>),
}

#[derive(Debug, Clone)]
pub(crate) struct UploadJob {
    pub(crate) label: Label,
    pub(crate) frame: LandmarkFrame,
}

/// The capture control layer.
///
/// Owns the collection session, the counts cache, the prediction on display
/// and the latest-frame slot. All of them are mutated only from the task that
/// drives the controller, so none of them is locked.
pub struct CaptureController {
    pub(crate) config: CaptureConfig,
    pub(crate) event_bus: Arc<dyn EventBus>,
    pub(crate) training: Arc<dyn TrainingClient>,
    pub(crate) counts_client: Arc<dyn CountsClient>,
    pub(crate) service_url: Option<String>,

    pub(crate) throttler: PredictionThrottler,
    pub(crate) session: CollectionSession,
    pub(crate) counts: CountsSnapshot,
    pub(crate) board: PredictionBoard,
    pub(crate) latest: LatestFrameWriter,

    pub(crate) predict_queue: Arc<BoundedQueue<LandmarkFrame>>,
    pub(crate) upload_queue: Arc<BoundedQueue<UploadJob>>,
    pub(crate) workers: Vec<JoinHandle<()>>,
    /// One-shot calls: training and counts refreshes.
    pub(crate) tasks: JoinSet<()>,
    pub(crate) completions_tx: mpsc::UnboundedSender<Completion>,
    pub(crate) completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl CaptureController {
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    pub fn session(&self) -> &CollectionSession {
        &self.session
    }

    pub fn counts(&self) -> &CountsSnapshot {
        &self.counts
    }

    pub fn prediction_board(&self) -> &PredictionBoard {
        &self.board
    }

    pub fn latest_frame(&self) -> LatestFrameReader {
        self.latest.reader()
    }

    /// Whether the cached counts still allow a session for `label`.
    pub fn can_start(&self, label: Label) -> bool {
        !self.session.is_active() && !self.counts.is_full(label, self.session.quota())
    }

    /// Training and counts requests not yet joined.
    pub fn background_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Spawns a one-shot request after joining the ones that already finished.
    pub(crate) fn spawn_background<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.reap_finished_tasks();
        self.tasks.spawn(task);
    }

    fn reap_finished_tasks(&mut self) {
        while let Some(joined) = self.tasks.try_join_next() {
            log_join_error(joined);
        }
    }
}

pub(crate) fn log_join_error(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        tracing::warn!(error = %e, "background request ended abnormally");
    }
}

pub(crate) fn spawn_predict_workers(
    queue: Arc<BoundedQueue<LandmarkFrame>>,
    workers: usize,
    client: Arc<dyn InferenceClient>,
    completions: mpsc::UnboundedSender<Completion>,
) -> Vec<JoinHandle<()>> {
    crate::dispatch::spawn_workers(queue, workers, move |frame: LandmarkFrame| {
        let client = Arc::clone(&client);
        let completions = completions.clone();
        async move {
            let result = client.predict(&frame).await;
            // The controller may already be gone; the result is then irrelevant.
            let _ = completions.send(Completion::Prediction {
                frame_timestamp_ms: frame.timestamp_ms(),
                result,
            });
        }
    })
}

pub(crate) fn spawn_upload_workers(
    queue: Arc<BoundedQueue<UploadJob>>,
    workers: usize,
    client: Arc<dyn UploadClient>,
    completions: mpsc::UnboundedSender<Completion>,
) -> Vec<JoinHandle<()>> {
    crate::dispatch::spawn_workers(queue, workers, move |job: UploadJob| {
        let client = Arc::clone(&client);
        let completions = completions.clone();
        async move {
            let result = client.upload(job.label, &job.frame).await;
            let _ = completions.send(Completion::Upload {
                label: job.label,
                frame_timestamp_ms: job.frame.timestamp_ms(),
                result,
            });
        }
    })
}
