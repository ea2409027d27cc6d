//! Startup, the processing loop and shutdown.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::CaptureResult;
use crate::event_bus::StatusUpdate;
use crate::health_check::HealthChecker;

use super::core::{log_join_error, CaptureController, Input};

impl CaptureController {
    /// Probes the service (when configured), loads the initial counts and
    /// reports readiness. A failed probe or fetch is reported, not fatal.
    pub async fn boot(&mut self) -> CaptureResult<()> {
        let probe_url = self.service_url.as_deref().filter(|_| self.config.service.health_check);
        if let Some(url) = probe_url {
            let checker = HealthChecker::new(Duration::from_millis(self.config.service.timeout_ms));
            let health = checker.check(url).await;
            if health.is_healthy {
                tracing::info!(url = %health.url, "landmark service reachable");
            } else {
                tracing::warn!(
                    url = %health.url,
                    error = health.error.as_deref().unwrap_or("unknown"),
                    "landmark service not reachable, continuing"
                );
            }
        }

        match self.counts_client.fetch_counts().await {
            Ok(snapshot) => {
                self.counts = snapshot;
                self.publish_counts().await?;
            }
            Err(e) => {
                tracing::warn!(error = %e, "initial counts fetch failed");
                self.publish_error(e.message()).await?;
            }
        }

        self.publish_status(StatusUpdate::Ready).await?;
        tracing::info!(
            interval_ms = self.throttler.interval_ms(),
            quota = self.session.quota(),
            "capture controller ready"
        );
        Ok(())
    }

    /// Processes detector output and commands in arrival order, together with
    /// network completions, until the input channel closes, then shuts down.
    pub async fn run(mut self, mut inputs: mpsc::Receiver<Input>) -> CaptureResult<Self> {
        loop {
            tokio::select! {
                biased;
                Some(completion) = self.completions_rx.recv() => {
                    self.handle_completion(completion).await?;
                }
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    log_join_error(joined);
                }
                input = inputs.recv() => match input {
                    Some(input) => self.handle_input(input).await?,
                    None => break,
                },
            }
        }

        tracing::info!("input closed, shutting down");
        self.shutdown().await?;
        Ok(self)
    }

    /// Stops accepting work, lets queued and in-flight calls finish, and
    /// applies their results.
    pub async fn shutdown(&mut self) -> CaptureResult<()> {
        self.predict_queue.close();
        self.upload_queue.close();

        for worker in self.workers.drain(..) {
            if let Err(e) = worker.await {
                tracing::warn!(error = %e, "dispatch worker ended abnormally");
            }
        }
        while let Some(joined) = self.tasks.join_next().await {
            log_join_error(joined);
        }
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.handle_completion(completion).await?;
        }
        Ok(())
    }
}
