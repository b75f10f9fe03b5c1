//! Object detection pipeline

use crate::config::SafetyThresholds;
use crate::error::{Capability, CapabilityError, PerceptionError, Result};
use crate::frame::{Frame, PixelBox};
use crate::metrics::{MetricsRegistry, DETECT_MS};
use crate::models::{Detector, ModelSlot};
use crate::processing::classifier::{
    coco_to_hazard, distance_of, lane_of, Distance, HazardType, Lane,
};
use crate::processing::with_deadline;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Detector hit in pixel space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: PixelBox,
    pub score: f32,
    pub class_name: String,
}

/// Detection with its hazard category, lane and distance band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    pub detection: Detection,
    pub hazard_type: HazardType,
    pub lane: Lane,
    pub distance: Distance,
}

impl Hazard {
    pub fn classify(
        detection: Detection,
        frame_width: u32,
        frame_height: u32,
        thresholds: &SafetyThresholds,
    ) -> Self {
        let hazard_type = coco_to_hazard(&detection.class_name);
        let lane = lane_of(
            detection.bbox.center_x(),
            frame_width as f32,
            thresholds.center_lane_band,
        );
        let distance = distance_of(
            detection.bbox.area(),
            frame_width as f32 * frame_height as f32,
            thresholds.near_area_ratio,
            thresholds.mid_area_ratio,
        );

        Self {
            detection,
            hazard_type,
            lane,
            distance,
        }
    }
}

/// Runs the detector on a frame and classifies what it finds
pub struct DetectionPipeline {
    detector: Arc<ModelSlot<dyn Detector>>,
    metrics: Arc<MetricsRegistry>,
    inference_timeout: Option<Duration>,
}

impl DetectionPipeline {
    pub fn new(detector: Arc<ModelSlot<dyn Detector>>, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            detector,
            metrics,
            inference_timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.inference_timeout = timeout;
        self
    }

    /// Detect and classify objects in `frame`.
    ///
    /// Records `detect_ms` only when the detector succeeds. Detector
    /// failures propagate as `ModelNotReady` / `InferenceFailure`; an empty
    /// list always means the detector really found nothing.
    pub async fn detect_objects(
        &self,
        frame: &Frame,
        thresholds: &SafetyThresholds,
    ) -> Result<Vec<Hazard>> {
        let detector = self.detector.get()?;
        let started = Instant::now();

        let raw = with_deadline(
            detector.detect(frame, thresholds.min_detr_score),
            self.inference_timeout,
        )
        .await
        .map_err(|e| PerceptionError::from_capability(Capability::Detector, e))?;

        if let Some(bad) = raw.iter().find(|d| !d.is_well_formed()) {
            warn!("Detector returned malformed box for {:?}", bad.label);
            return Err(PerceptionError::from_capability(
                Capability::Detector,
                CapabilityError::Malformed(format!(
                    "score {} / box [{}, {}, {}, {}] for {:?}",
                    bad.score, bad.xmin, bad.ymin, bad.xmax, bad.ymax, bad.label
                )),
            ));
        }

        let (width, height) = (frame.width(), frame.height());
        let raw_count = raw.len();
        let hazards: Vec<Hazard> = raw
            .into_iter()
            // The detector is asked to honor the cutoff; enforce it anyway
            .filter(|d| d.score >= thresholds.min_detr_score)
            .filter_map(|d| {
                let bbox = PixelBox::from_normalized_corners(
                    d.xmin, d.ymin, d.xmax, d.ymax, width, height,
                )?;
                let detection = Detection {
                    bbox,
                    score: d.score,
                    class_name: d.label,
                };
                Some(Hazard::classify(detection, width, height, thresholds))
            })
            .collect();

        self.metrics
            .observe(DETECT_MS, started.elapsed().as_secs_f64() * 1000.0);
        debug!("Detected {} objects ({} raw)", hazards.len(), raw_count);
        Ok(hazards)
    }
}
