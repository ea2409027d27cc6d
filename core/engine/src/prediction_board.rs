//! Holds the prediction currently on display.
//!
//! Inference responses can complete out of order. With the staleness guard on,
//! a result is only shown when its originating frame is not older than the one
//! behind the displayed result.

use crate::types::PredictionResult;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayedPrediction {
    pub frame_timestamp_ms: u64,
    pub result: PredictionResult,
}

#[derive(Debug, Clone)]
pub struct PredictionBoard {
    discard_stale: bool,
    current: Option<DisplayedPrediction>,
}

impl PredictionBoard {
    pub fn new(discard_stale: bool) -> Self {
        Self {
            discard_stale,
            current: None,
        }
    }

    /// Returns whether `result` replaced the displayed prediction.
    pub fn offer(&mut self, frame_timestamp_ms: u64, result: PredictionResult) -> bool {
        if self.discard_stale {
            if let Some(current) = &self.current {
                if frame_timestamp_ms < current.frame_timestamp_ms {
                    return false;
                }
            }
        }
        self.current = Some(DisplayedPrediction {
            frame_timestamp_ms,
            result,
        });
        true
    }

    pub fn current(&self) -> Option<&DisplayedPrediction> {
        self.current.as_ref()
    }
}

impl Default for PredictionBoard {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Label;

    fn result(label: Label) -> PredictionResult {
        PredictionResult::new(label, 0.9).unwrap()
    }

    #[test]
    fn older_frame_response_is_discarded() {
        let mut board = PredictionBoard::default();
        assert!(board.offer(200, result(Label::E)));
        assert!(!board.offer(100, result(Label::A)));
        let shown = board.current().unwrap();
        assert_eq!(shown.frame_timestamp_ms, 200);
        assert_eq!(shown.result.label, Label::E);
    }

    #[test]
    fn equal_or_newer_frames_replace() {
        let mut board = PredictionBoard::default();
        assert!(board.offer(100, result(Label::A)));
        assert!(board.offer(100, result(Label::I)));
        assert!(board.offer(700, result(Label::O)));
        assert_eq!(board.current().unwrap().result.label, Label::O);
    }

    #[test]
    fn without_guard_last_arrival_wins() {
        let mut board = PredictionBoard::new(false);
        board.offer(200, result(Label::E));
        assert!(board.offer(100, result(Label::A)));
        assert_eq!(board.current().unwrap().frame_timestamp_ms, 100);
    }
}
