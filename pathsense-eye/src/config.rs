//! Configuration for pathsense-eye

use crate::error::{PerceptionError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Process-wide safety policy consumed by every perception component.
///
/// Keys serialize with their upper-case policy names so a thresholds file
/// reads `MIN_ITEM_COSINE = 0.8`. Missing keys take the default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct SafetyThresholds {
    /// Drop detections below this confidence
    pub min_detr_score: f32,
    /// Width of the center lane as a fraction of frame width
    pub center_lane_band: f32,
    /// bbox-area / frame-area at or above which an object is near
    pub near_area_ratio: f32,
    /// bbox-area / frame-area at or above which an object is mid-range
    pub mid_area_ratio: f32,
    /// Acceptance bar for item matches
    pub min_item_cosine: f32,
    /// Max candidates embedded per search
    pub topk_item_candidates: usize,
    /// Advisory per-frame budget for the external scheduler; not enforced here
    pub target_frame_ms: u64,
    /// Concurrent search limit
    pub max_concurrent_infer: usize,
    /// Advisory miss-streak length for the guidance layer; not tracked here
    pub max_silent_frames_warn: u32,
}

impl Default for SafetyThresholds {
    fn default() -> Self {
        Self {
            min_detr_score: 0.35,
            center_lane_band: 0.34,
            near_area_ratio: 0.12,
            mid_area_ratio: 0.04,
            min_item_cosine: 0.78,
            topk_item_candidates: 5,
            target_frame_ms: 120,
            max_concurrent_infer: 1,
            max_silent_frames_warn: 20,
        }
    }
}

impl SafetyThresholds {
    /// Validate thresholds
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !in_unit_range(self.min_detr_score) {
            return Err("MIN_DETR_SCORE must be within [0, 1]".to_string());
        }

        if !self.center_lane_band.is_finite()
            || self.center_lane_band <= 0.0
            || self.center_lane_band >= 1.0
        {
            return Err("CENTER_LANE_BAND must be within (0, 1)".to_string());
        }

        for (name, ratio) in [
            ("NEAR_AREA_RATIO", self.near_area_ratio),
            ("MID_AREA_RATIO", self.mid_area_ratio),
        ] {
            if !ratio.is_finite() || ratio <= 0.0 || ratio > 1.0 {
                return Err(format!("{} must be within (0, 1]", name));
            }
        }

        if self.near_area_ratio <= self.mid_area_ratio {
            return Err("NEAR_AREA_RATIO must be greater than MID_AREA_RATIO".to_string());
        }

        if !in_unit_range(self.min_item_cosine) {
            return Err("MIN_ITEM_COSINE must be within [0, 1]".to_string());
        }

        if self.topk_item_candidates == 0 {
            return Err("TOPK_ITEM_CANDIDATES must be at least 1".to_string());
        }

        if self.max_concurrent_infer == 0 {
            return Err("MAX_CONCURRENT_INFER must be at least 1".to_string());
        }

        if self.target_frame_ms == 0 {
            return Err("TARGET_FRAME_MS must be non-zero".to_string());
        }

        Ok(())
    }

    /// Parse thresholds from TOML and validate them
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let thresholds: SafetyThresholds = toml::from_str(source)
            .map_err(|e| PerceptionError::Config(format!("Failed to parse thresholds: {}", e)))?;
        thresholds.validate().map_err(PerceptionError::Config)?;
        Ok(thresholds)
    }

    /// Load thresholds from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}

fn in_unit_range(value: f32) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

/// Perception core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionConfig {
    pub thresholds: SafetyThresholds,
    /// Samples kept per latency buffer
    pub metrics_capacity: usize,
    /// Optional deadline around each Detector/Embedder call
    pub inference_timeout: Option<Duration>,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            thresholds: SafetyThresholds::default(),
            metrics_capacity: 128,
            inference_timeout: None,
        }
    }
}

impl PerceptionConfig {
    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.thresholds.validate()?;

        if self.metrics_capacity == 0 {
            return Err("Metrics capacity must be non-zero".to_string());
        }

        if let Some(timeout) = self.inference_timeout {
            if timeout.is_zero() {
                return Err("Inference timeout must be non-zero when set".to_string());
            }
        }

        Ok(())
    }
}
