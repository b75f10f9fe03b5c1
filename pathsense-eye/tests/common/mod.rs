//! Shared fakes for pathsense-eye integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use pathsense_eye::models::EmbedOptions;
use pathsense_eye::{
    CapabilityError, Detector, Embedder, Embedding, Frame, PerceptionConfig, PerceptionCore,
    RawDetection, SafetyThresholds,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

pub const EMBED_INPUT: (u32, u32) = (32, 32);

/// Paint a black frame with solid rectangles whose red channel is `key`
pub fn painted_frame(width: u32, height: u32, regions: &[(u32, u32, u32, u32, u8)]) -> Frame {
    let mut image = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
    for &(x, y, w, h, key) in regions {
        for py in y..(y + h).min(height) {
            for px in x..(x + w).min(width) {
                image.put_pixel(px, py, Rgba([key, 0, 0, 255]));
            }
        }
    }
    Frame::from_image(image).unwrap()
}

/// Detection for a pixel box, expressed as normalized corners
pub fn detection_at(
    label: &str,
    score: f32,
    (x, y, w, h): (u32, u32, u32, u32),
    (frame_w, frame_h): (u32, u32),
) -> RawDetection {
    let (fw, fh) = (frame_w as f32, frame_h as f32);
    RawDetection::new(
        label,
        score,
        [
            x as f32 / fw,
            y as f32 / fh,
            (x + w) as f32 / fw,
            (y + h) as f32 / fh,
        ],
    )
}

/// Unit vector whose cosine with `target_vector()` is `similarity`
pub fn vector_with_similarity(similarity: f32) -> Vec<f32> {
    vec![similarity, (1.0 - similarity * similarity).max(0.0).sqrt(), 0.0]
}

pub fn target_vector() -> Embedding {
    Embedding::new(vec![1.0, 0.0, 0.0])
}

/// Returns a fixed list of detections and counts calls
pub struct ScriptedDetector {
    detections: Vec<RawDetection>,
    pub calls: AtomicUsize,
}

impl ScriptedDetector {
    pub fn new(detections: Vec<RawDetection>) -> Self {
        Self {
            detections,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Detector for ScriptedDetector {
    async fn detect(
        &self,
        _frame: &Frame,
        min_score: f32,
    ) -> Result<Vec<RawDetection>, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .detections
            .iter()
            .filter(|d| d.score >= min_score)
            .cloned()
            .collect())
    }
}

/// Blocks inside `detect` until released, signalling once it has entered
pub struct GatedDetector {
    detections: Vec<RawDetection>,
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl GatedDetector {
    pub fn new(detections: Vec<RawDetection>) -> Self {
        Self {
            detections,
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl Detector for GatedDetector {
    async fn detect(
        &self,
        _frame: &Frame,
        _min_score: f32,
    ) -> Result<Vec<RawDetection>, CapabilityError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(self.detections.clone())
    }
}

/// Embeds a region by looking up the red channel of its center pixel.
/// Unknown keys embed orthogonally to `target_vector()`.
pub struct KeyedEmbedder {
    vectors: HashMap<u8, Vec<f32>>,
    pub calls: AtomicUsize,
}

impl KeyedEmbedder {
    pub fn new(vectors: impl IntoIterator<Item = (u8, Vec<f32>)>) -> Self {
        Self {
            vectors: vectors.into_iter().collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for KeyedEmbedder {
    fn input_size(&self) -> (u32, u32) {
        EMBED_INPUT
    }

    async fn embed(
        &self,
        region: &RgbaImage,
        _options: EmbedOptions,
    ) -> Result<Vec<f32>, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if region.dimensions() != EMBED_INPUT {
            return Err(CapabilityError::Malformed(format!(
                "expected {:?} input, got {:?}",
                EMBED_INPUT,
                region.dimensions()
            )));
        }
        let key = region.get_pixel(EMBED_INPUT.0 / 2, EMBED_INPUT.1 / 2)[0];
        Ok(self
            .vectors
            .get(&key)
            .cloned()
            .unwrap_or_else(|| vec![0.0, 0.0, 1.0]))
    }
}

/// Fails every call after the first `ok_calls`
pub struct FlakyEmbedder {
    ok_calls: usize,
    calls: AtomicUsize,
}

impl FlakyEmbedder {
    pub fn new(ok_calls: usize) -> Self {
        Self {
            ok_calls,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Embedder for FlakyEmbedder {
    fn input_size(&self) -> (u32, u32) {
        EMBED_INPUT
    }

    async fn embed(
        &self,
        _region: &RgbaImage,
        _options: EmbedOptions,
    ) -> Result<Vec<f32>, CapabilityError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.ok_calls {
            Ok(vector_with_similarity(0.9))
        } else {
            Err(CapabilityError::runtime("embedder session lost"))
        }
    }
}

/// Route crate logs to the test writer; set `RUST_LOG=pathsense_eye=debug` to see them
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn core_with(
    thresholds: SafetyThresholds,
    detector: Arc<dyn Detector>,
    embedder: Arc<dyn Embedder>,
) -> PerceptionCore {
    init_tracing();
    let config = PerceptionConfig {
        thresholds,
        ..PerceptionConfig::default()
    };
    PerceptionCore::with_capabilities(config, detector, embedder).unwrap()
}
