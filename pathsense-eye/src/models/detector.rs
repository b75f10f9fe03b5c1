//! Object detector capability

use crate::error::CapabilityError;
use crate::frame::Frame;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Detector output before classification.
///
/// Corners are normalized to `[0, 1]` relative to the frame the detector
/// was given; the detection pipeline converts them to pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub label: String,
    pub score: f32,
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
}

impl RawDetection {
    pub fn new(label: impl Into<String>, score: f32, corners: [f32; 4]) -> Self {
        let [xmin, ymin, xmax, ymax] = corners;
        Self {
            label: label.into(),
            score,
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    pub(crate) fn is_well_formed(&self) -> bool {
        self.score.is_finite()
            && (0.0..=1.0).contains(&self.score)
            && [self.xmin, self.ymin, self.xmax, self.ymax]
                .iter()
                .all(|v| v.is_finite())
    }
}

/// Object detection model (DETR, YOLO, ...)
#[async_trait]
pub trait Detector: Send + Sync {
    /// Detect objects in `frame`, returning only boxes scoring at least
    /// `min_score`.
    async fn detect(
        &self,
        frame: &Frame,
        min_score: f32,
    ) -> Result<Vec<RawDetection>, CapabilityError>;
}
