//! Minimum-interval gate for inference requests.
//!
//! Frames arriving before the interval has elapsed are discarded, not queued.

/// Default spacing between prediction requests.
pub const DEFAULT_PREDICT_INTERVAL_MS: u64 = 600;

#[derive(Debug, Clone)]
pub struct PredictionThrottler {
    interval_ms: u64,
    /// `None` until the first fire.
    last_fire_ms: Option<u64>,
}

impl PredictionThrottler {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_fire_ms: None,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Returns true and records `now_ms` when a request may be issued.
    ///
    /// A clock reading earlier than the last fire counts as no time elapsed.
    pub fn should_predict(&mut self, now_ms: u64) -> bool {
        let fire = match self.last_fire_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.interval_ms,
        };
        if fire {
            self.last_fire_ms = Some(now_ms);
        }
        fire
    }
}

impl Default for PredictionThrottler {
    fn default() -> Self {
        Self::new(DEFAULT_PREDICT_INTERVAL_MS)
    }
}
