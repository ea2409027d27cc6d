//! Data model: landmark frames, labels, predictions and per-label counts.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CaptureError, CaptureResult};

/// Landmarks per detected hand.
pub const HAND_LANDMARK_COUNT: usize = 21;

/// One tracked joint. x/y are in pixels, z is the detector's relative depth.
///
/// On the wire a point is the array `[x, y, z]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Point3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3D {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<[f32; 3]> for Point3D {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Point3D> for [f32; 3] {
    fn from(p: Point3D) -> Self {
        [p.x, p.y, p.z]
    }
}

/// The ordered landmarks of one hand at one instant.
///
/// Joint order is preserved from construction through serialisation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandmarkFrame {
    points: Vec<Point3D>,
    /// Monotonic capture time in milliseconds.
    timestamp_ms: u64,
}

impl LandmarkFrame {
    pub fn new(points: Vec<Point3D>, timestamp_ms: u64) -> CaptureResult<Self> {
        if points.len() != HAND_LANDMARK_COUNT {
            return Err(CaptureError::invalid_input(format!(
                "expected {} landmarks, got {}",
                HAND_LANDMARK_COUNT,
                points.len()
            )));
        }
        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(CaptureError::invalid_input(format!(
                "landmark {} has a non-finite coordinate",
                index
            )));
        }
        Ok(Self {
            points,
            timestamp_ms,
        })
    }

    /// Builds a frame from detector output normalised to `[0, 1]`, scaling x/y
    /// to the image size. A missing depth is taken as 0.
    pub fn from_normalized(
        normalized: &[(f32, f32, Option<f32>)],
        width: u32,
        height: u32,
        timestamp_ms: u64,
    ) -> CaptureResult<Self> {
        let w = width as f32;
        let h = height as f32;
        let points = normalized
            .iter()
            .map(|&(x, y, z)| Point3D::new(x * w, y * h, z.unwrap_or(0.0)))
            .collect();
        Self::new(points, timestamp_ms)
    }

    pub fn points(&self) -> &[Point3D] {
        &self.points
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }
}

/// Class identifiers samples are collected under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Label {
    A,
    E,
    I,
    O,
    U,
}

impl Label {
    pub const ALL: [Label; 5] = [Label::A, Label::E, Label::I, Label::O, Label::U];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::A => "A",
            Label::E => "E",
            Label::I => "I",
            Label::O => "O",
            Label::U => "U",
        }
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Label::ALL
            .iter()
            .copied()
            .find(|label| label.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| CaptureError::invalid_input(format!("unknown label '{}'", trimmed)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionResult {
    pub label: Label,
    /// In `[0, 1]`.
    pub confidence: f32,
}

impl PredictionResult {
    pub fn new(label: Label, confidence: f32) -> CaptureResult<Self> {
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(CaptureError::malformed(format!(
                "confidence {} outside [0, 1]",
                confidence
            )));
        }
        Ok(Self { label, confidence })
    }
}

/// Cached per-label sample counts. The remote service holds the real numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CountsSnapshot {
    counts: BTreeMap<Label, u32>,
}

impl CountsSnapshot {
    pub fn new(counts: BTreeMap<Label, u32>) -> Self {
        Self { counts }
    }

    /// Labels outside the closed set are skipped.
    pub fn from_wire<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, u32)>,
        K: AsRef<str>,
    {
        let mut counts = BTreeMap::new();
        for (key, count) in entries {
            match key.as_ref().parse::<Label>() {
                Ok(label) => {
                    counts.insert(label, count);
                }
                Err(_) => {
                    tracing::debug!(label = key.as_ref(), "ignoring count for unknown label");
                }
            }
        }
        Self { counts }
    }

    /// Omitted labels count as zero.
    pub fn count(&self, label: Label) -> u32 {
        self.counts.get(&label).copied().unwrap_or(0)
    }

    pub fn is_full(&self, label: Label, quota: u32) -> bool {
        self.count(label) >= quota
    }

    pub fn iter(&self) -> impl Iterator<Item = (Label, u32)> + '_ {
        self.counts.iter().map(|(label, count)| (*label, *count))
    }
}

/// Acknowledgement of a call whose response body is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack;

#[cfg(test)]
pub(crate) fn test_frame(timestamp_ms: u64) -> LandmarkFrame {
    let points = (0..HAND_LANDMARK_COUNT)
        .map(|i| Point3D::new(i as f32, i as f32 * 2.0, -(i as f32) * 0.25))
        .collect();
    LandmarkFrame::new(points, timestamp_ms).expect("valid test frame")
}
