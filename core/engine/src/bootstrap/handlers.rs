//! Frame, command and completion handling.
//!
//! Every handler runs to completion on the controller task before the next
//! input is looked at. Network calls are only enqueued or spawned here, never
//! awaited.

use std::sync::Arc;
use std::time::Duration;

use crate::collection::RecordOutcome;
use crate::dispatch::PushOutcome;
use crate::error::CaptureResult;
use crate::event_bus::StatusUpdate;
use crate::types::{Label, LandmarkFrame};

use super::core::{CaptureController, Command, Completion, DetectorOutput, Input, UploadJob};

impl CaptureController {
    pub async fn handle_input(&mut self, input: Input) -> CaptureResult<()> {
        match input {
            Input::Detector(output) => self.handle_detector(output).await,
            Input::Command(command) => self.handle_command(command).await,
        }
    }

    pub async fn handle_detector(&mut self, output: DetectorOutput) -> CaptureResult<()> {
        match output {
            DetectorOutput::Hand(frame) => self.handle_frame(frame).await,
            DetectorOutput::NoHand => {
                self.latest.publish(None);
                Ok(())
            }
        }
    }

    async fn handle_frame(&mut self, frame: LandmarkFrame) -> CaptureResult<()> {
        self.latest.publish(Some(frame.clone()));

        if self.throttler.should_predict(frame.timestamp_ms()) {
            if let PushOutcome::Dropped(stale) = self.predict_queue.push(frame.clone()) {
                tracing::debug!(
                    frame_ts = stale.timestamp_ms(),
                    "predict queue full, frame dropped"
                );
            }
        }

        match self.session.record(&self.counts) {
            RecordOutcome::Idle => Ok(()),
            RecordOutcome::Recorded {
                label,
                sample_count,
            } => {
                let frame_ts = frame.timestamp_ms();
                match self.upload_queue.push(UploadJob { label, frame }) {
                    PushOutcome::Queued => {}
                    PushOutcome::Dropped(job) => tracing::warn!(
                        label = %job.label,
                        frame_ts = job.frame.timestamp_ms(),
                        "upload queue full, sample dropped"
                    ),
                    PushOutcome::Closed(_) => {
                        tracing::warn!(%label, frame_ts, "upload queue closed, sample dropped")
                    }
                }
                self.publish_progress(Some(label), sample_count).await
            }
            RecordOutcome::QuotaReached {
                label,
                sample_count,
            } => {
                tracing::info!(%label, sample_count, "quota reached, stopping session");
                self.session.stop();
                self.publish_status(StatusUpdate::QuotaReached { label }).await?;
                self.publish_progress(None, 0).await?;
                self.schedule_counts_refresh(self.refresh_delay());
                Ok(())
            }
        }
    }

    pub async fn handle_command(&mut self, command: Command) -> CaptureResult<()> {
        match command {
            Command::StartCollection(label) => self.start_collection(label).await,
            Command::StopCollection => self.stop_collection().await,
            Command::Train => self.start_training().await,
            Command::RefreshCounts => {
                self.schedule_counts_refresh(Duration::ZERO);
                Ok(())
            }
        }
    }

    async fn start_collection(&mut self, label: Label) -> CaptureResult<()> {
        if self.session.is_active() {
            tracing::debug!(
                requested = %label,
                active = ?self.session.label(),
                "collection already running, start ignored"
            );
            return Ok(());
        }
        if self.counts.is_full(label, self.session.quota()) {
            tracing::info!(%label, count = self.counts.count(label), "label is full, not starting");
            return self.publish_status(StatusUpdate::QuotaReached { label }).await;
        }

        self.session.start(label);
        tracing::info!(%label, "collection started");
        self.publish_status(StatusUpdate::Collecting { label }).await?;
        self.publish_progress(Some(label), 0).await
    }

    async fn stop_collection(&mut self) -> CaptureResult<()> {
        let label = self.session.label();
        let samples = self.session.sample_count();
        if self.session.stop() {
            tracing::info!(label = ?label, samples, "collection stopped");
        }
        self.publish_status(StatusUpdate::Stopped).await?;
        self.publish_progress(None, 0).await?;
        self.schedule_counts_refresh(self.refresh_delay());
        Ok(())
    }

    async fn start_training(&mut self) -> CaptureResult<()> {
        self.publish_status(StatusUpdate::Training).await?;
        let client = Arc::clone(&self.training);
        let completions = self.completions_tx.clone();
        self.spawn_background(async move {
            let result = client.train().await;
            let _ = completions.send(Completion::Training(result));
        });
        Ok(())
    }

    pub(crate) fn schedule_counts_refresh(&mut self, delay: Duration) {
        let client = Arc::clone(&self.counts_client);
        let completions = self.completions_tx.clone();
        self.spawn_background(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let result = client.fetch_counts().await;
            let _ = completions.send(Completion::Counts(result));
        });
    }

    fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.config.collection.refresh_delay_ms)
    }

    /// Applies a finished network call. Failures only produce a status; they
    /// never touch the session, the counts cache or the displayed prediction.
    pub async fn handle_completion(&mut self, completion: Completion) -> CaptureResult<()> {
        match completion {
            Completion::Prediction {
                frame_timestamp_ms,
                result: Ok(result),
            } => {
                if self.board.offer(frame_timestamp_ms, result) {
                    self.publish_prediction(frame_timestamp_ms, &result).await
                } else {
                    tracing::debug!(frame_ts = frame_timestamp_ms, "stale prediction discarded");
                    Ok(())
                }
            }
            Completion::Prediction {
                frame_timestamp_ms,
                result: Err(e),
            } => {
                tracing::warn!(
                    frame_ts = frame_timestamp_ms,
                    transport = e.is_transport_class(),
                    error = %e,
                    "prediction failed"
                );
                self.publish_error(e.message()).await
            }
            Completion::Upload { result: Ok(_), .. } => Ok(()),
            Completion::Upload {
                label,
                frame_timestamp_ms,
                result: Err(e),
            } => {
                tracing::warn!(
                    %label,
                    frame_ts = frame_timestamp_ms,
                    transport = e.is_transport_class(),
                    error = %e,
                    "upload failed"
                );
                self.publish_error(e.message()).await
            }
            Completion::Training(Ok(_)) => {
                tracing::info!("training finished");
                self.publish_status(StatusUpdate::Trained).await
            }
            Completion::Training(Err(e)) => {
                tracing::warn!(error = %e, kind = ?e.kind(), "training failed");
                self.publish_error(e.message()).await
            }
            Completion::Counts(Ok(snapshot)) => {
                self.counts = snapshot;
                self.publish_counts().await
            }
            Completion::Counts(Err(e)) => {
                tracing::warn!(error = %e, "counts refresh failed, keeping cached counts");
                self.publish_error(e.message()).await
            }
        }
    }
}
