//! JSON-lines input protocol read by `capture_engine`.
//!
//! One input per line:
//!
//! ```text
//! {"type":"frame","timestamp_ms":1200,"landmarks":[[x,y,z], ...]}
//! {"type":"frame","landmarks":[[x,y], ...],"size":{"width":640,"height":480}}
//! {"type":"no_hand"}
//! {"type":"start","label":"A"}
//! {"type":"stop"} | {"type":"train"} | {"type":"refresh"}
//! ```
//!
//! A point may omit its depth, which is then taken as 0. With `size`, x/y are
//! detector-normalised and get scaled to pixels.

use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use crate::bootstrap::{Command, DetectorOutput, Input};
use crate::error::{CaptureError, CaptureResult};
use crate::types::{Label, LandmarkFrame};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WirePoint {
    Xyz([f32; 3]),
    Xy([f32; 2]),
}

impl WirePoint {
    fn parts(self) -> (f32, f32, Option<f32>) {
        match self {
            WirePoint::Xyz([x, y, z]) => (x, y, Some(z)),
            WirePoint::Xy([x, y]) => (x, y, None),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputLine {
    Frame {
        landmarks: Vec<WirePoint>,
        timestamp_ms: Option<u64>,
        /// Present when the landmarks are normalised to `[0, 1]`.
        size: Option<FrameSize>,
    },
    NoHand,
    Start {
        label: Label,
    },
    Stop,
    Train,
    Refresh,
}

impl InputLine {
    pub fn parse(line: &str) -> CaptureResult<Self> {
        serde_json::from_str(line)
            .map_err(|e| CaptureError::invalid_input(format!("unreadable input line: {}", e)))
    }

    /// Converts to a controller input. `now_ms` supplies the timestamp of
    /// frames that carry none.
    pub fn into_input(self, now_ms: impl FnOnce() -> u64) -> CaptureResult<Input> {
        let input = match self {
            InputLine::Frame {
                landmarks,
                timestamp_ms,
                size,
            } => {
                let timestamp_ms = timestamp_ms.unwrap_or_else(now_ms);
                let parts: Vec<_> = landmarks.into_iter().map(WirePoint::parts).collect();
                let (width, height) = match size {
                    Some(FrameSize { width, height }) => (width, height),
                    None => (1, 1),
                };
                let frame = LandmarkFrame::from_normalized(&parts, width, height, timestamp_ms)?;
                Input::Detector(DetectorOutput::Hand(frame))
            }
            InputLine::NoHand => Input::Detector(DetectorOutput::NoHand),
            InputLine::Start { label } => Input::Command(Command::StartCollection(label)),
            InputLine::Stop => Input::Command(Command::StopCollection),
            InputLine::Train => Input::Command(Command::Train),
            InputLine::Refresh => Input::Command(Command::RefreshCounts),
        };
        Ok(input)
    }
}

/// Forwards every readable line of `reader` to `inputs`, in order, until end of
/// input or until the receiver is gone. Unreadable lines and invalid frames are
/// logged and skipped. Returns how many inputs were forwarded.
pub async fn forward_inputs<R, C>(
    reader: R,
    inputs: mpsc::Sender<Input>,
    now_ms: C,
) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
    C: Fn() -> u64,
{
    let mut lines = reader.lines();
    let mut forwarded = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let input = match InputLine::parse(line).and_then(|parsed| parsed.into_input(&now_ms)) {
            Ok(input) => input,
            Err(e) => {
                tracing::warn!(error = %e, "skipping input line");
                continue;
            }
        };
        if inputs.send(input).await.is_err() {
            tracing::debug!("controller gone, input reader stopping");
            break;
        }
        forwarded += 1;
    }
    Ok(forwarded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HAND_LANDMARK_COUNT;

    fn points_json(point: &str) -> String {
        vec![point; HAND_LANDMARK_COUNT].join(",")
    }

    #[test]
    fn command_lines_map_to_commands() {
        let cases = [
            (r#"{"type":"start","label":"E"}"#, Command::StartCollection(Label::E)),
            (r#"{"type":"stop"}"#, Command::StopCollection),
            (r#"{"type":"train"}"#, Command::Train),
            (r#"{"type":"refresh"}"#, Command::RefreshCounts),
        ];
        for (line, expected) in cases {
            match InputLine::parse(line).unwrap().into_input(|| 0).unwrap() {
                Input::Command(command) => assert_eq!(command, expected),
                other => panic!("expected a command for {}, got {:?}", line, other),
            }
        }
    }

    #[test]
    fn no_hand_line_clears_the_detector() {
        let input = InputLine::parse(r#"{"type":"no_hand"}"#)
            .unwrap()
            .into_input(|| 0)
            .unwrap();
        assert!(matches!(input, Input::Detector(DetectorOutput::NoHand)));
    }

    #[test]
    fn pixel_frame_keeps_coordinates_and_timestamp() {
        let line = format!(
            r#"{{"type":"frame","timestamp_ms":1200,"landmarks":[{}]}}"#,
            points_json("[120.0,80.0,-0.5]")
        );
        let Input::Detector(DetectorOutput::Hand(frame)) =
            InputLine::parse(&line).unwrap().into_input(|| 7).unwrap()
        else {
            panic!("expected a hand frame");
        };
        assert_eq!(frame.timestamp_ms(), 1200);
        assert_eq!(frame.points()[0].x, 120.0);
        assert_eq!(frame.points()[0].y, 80.0);
        assert_eq!(frame.points()[0].z, -0.5);
    }

    #[test]
    fn normalised_frame_is_scaled_and_missing_depth_is_zero() {
        let line = format!(
            r#"{{"type":"frame","landmarks":[{}],"size":{{"width":640,"height":480}}}}"#,
            points_json("[0.5,0.25]")
        );
        let Input::Detector(DetectorOutput::Hand(frame)) =
            InputLine::parse(&line).unwrap().into_input(|| 42).unwrap()
        else {
            panic!("expected a hand frame");
        };
        assert_eq!(frame.timestamp_ms(), 42);
        assert_eq!(frame.points()[3].x, 320.0);
        assert_eq!(frame.points()[3].y, 120.0);
        assert_eq!(frame.points()[3].z, 0.0);
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert!(InputLine::parse("not json").is_err());
        assert!(InputLine::parse(r#"{"type":"jump"}"#).is_err());
        assert!(InputLine::parse(r#"{"type":"start","label":"Z"}"#).is_err());
    }

    #[test]
    fn short_frame_is_invalid() {
        let line = r#"{"type":"frame","landmarks":[[1.0,2.0,3.0]]}"#;
        let err = InputLine::parse(line).unwrap().into_input(|| 0).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn forwards_in_order_skipping_bad_lines_until_eof() {
        let text = format!(
            "{}\n\nnot json\n{}\n{}\n{}\n",
            r#"{"type":"start","label":"A"}"#,
            r#"{"type":"frame","landmarks":[[1.0,2.0,3.0]]}"#,
            format!(
                r#"{{"type":"frame","timestamp_ms":5,"landmarks":[{}]}}"#,
                points_json("[1.0,2.0,3.0]")
            ),
            r#"{"type":"stop"}"#,
        );
        let (tx, mut rx) = mpsc::channel(8);

        let forwarded = forward_inputs(text.as_bytes(), tx, || 0).await.unwrap();
        assert_eq!(forwarded, 3);

        assert!(matches!(
            rx.recv().await,
            Some(Input::Command(Command::StartCollection(Label::A)))
        ));
        match rx.recv().await {
            Some(Input::Detector(DetectorOutput::Hand(frame))) => {
                assert_eq!(frame.timestamp_ms(), 5)
            }
            other => panic!("expected a frame, got {:?}", other),
        }
        assert!(matches!(
            rx.recv().await,
            Some(Input::Command(Command::StopCollection))
        ));
        // The sender is dropped at end of input.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn stops_when_the_controller_is_gone() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let forwarded = forward_inputs(&b"{\"type\":\"train\"}\n"[..], tx, || 0)
            .await
            .unwrap();
        assert_eq!(forwarded, 0);
    }
}
