//! Perception core facade
//!
//! Owns the capability slots, the inference governor, the metrics registry
//! and the active safety thresholds, and wires the detection, embedding and
//! search pipelines over them. Hosts construct one per session.

use crate::config::{PerceptionConfig, SafetyThresholds};
use crate::error::{Capability, PerceptionError, Result};
use crate::frame::Frame;
use crate::metrics::{MetricSummary, MetricsRegistry};
use crate::models::{Detector, Embedder, Embedding, ModelSlot};
use crate::processing::{
    DetectionPipeline, EmbeddingGenerator, Hazard, InferenceGovernor, ProximitySearch,
    SearchOutcome,
};
use image::RgbaImage;
use parking_lot::RwLock;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

pub struct PerceptionCore {
    thresholds: RwLock<Arc<SafetyThresholds>>,
    detector: Arc<ModelSlot<dyn Detector>>,
    embedder: Arc<ModelSlot<dyn Embedder>>,
    metrics: Arc<MetricsRegistry>,
    governor: Arc<InferenceGovernor>,
    detection: Arc<DetectionPipeline>,
    embedding: Arc<EmbeddingGenerator>,
    search: ProximitySearch,
}

impl PerceptionCore {
    /// Create a core with both capabilities not yet loaded
    pub fn new(config: PerceptionConfig) -> Result<Self> {
        Self::build(
            config,
            ModelSlot::not_ready(Capability::Detector),
            ModelSlot::not_ready(Capability::Embedder),
        )
    }

    /// Create a core with both capabilities already loaded
    pub fn with_capabilities(
        config: PerceptionConfig,
        detector: Arc<dyn Detector>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        Self::build(
            config,
            ModelSlot::ready(Capability::Detector, detector),
            ModelSlot::ready(Capability::Embedder, embedder),
        )
    }

    fn build(
        config: PerceptionConfig,
        detector: ModelSlot<dyn Detector>,
        embedder: ModelSlot<dyn Embedder>,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|e| PerceptionError::Config(format!("Invalid perception config: {}", e)))?;

        let detector = Arc::new(detector);
        let embedder = Arc::new(embedder);
        let metrics = Arc::new(MetricsRegistry::with_capacity(config.metrics_capacity));
        let governor = Arc::new(InferenceGovernor::new(
            config.thresholds.max_concurrent_infer,
        ));

        let detection = Arc::new(
            DetectionPipeline::new(detector.clone(), metrics.clone())
                .with_timeout(config.inference_timeout),
        );
        let embedding = Arc::new(
            EmbeddingGenerator::new(embedder.clone(), metrics.clone())
                .with_timeout(config.inference_timeout),
        );
        let search = ProximitySearch::new(
            detection.clone(),
            embedding.clone(),
            governor.clone(),
            metrics.clone(),
        );

        Ok(Self {
            thresholds: RwLock::new(Arc::new(config.thresholds)),
            detector,
            embedder,
            metrics,
            governor,
            detection,
            embedding,
            search,
        })
    }

    pub fn install_detector(&self, detector: Arc<dyn Detector>) {
        self.detector.install(detector);
    }

    pub fn install_embedder(&self, embedder: Arc<dyn Embedder>) {
        self.embedder.install(embedder);
    }

    pub fn clear_detector(&self) {
        self.detector.clear();
    }

    pub fn clear_embedder(&self) {
        self.embedder.clear();
    }

    pub fn detector_ready(&self) -> bool {
        self.detector.is_ready()
    }

    pub fn embedder_ready(&self) -> bool {
        self.embedder.is_ready()
    }

    /// Thresholds in force for the next call
    pub fn thresholds(&self) -> Arc<SafetyThresholds> {
        self.thresholds.read().clone()
    }

    /// Replace the safety thresholds between calls.
    ///
    /// Calls already running keep the snapshot they started with. Refused
    /// while a search holds the inference slot, since the governor limit is
    /// part of the policy. The idle check, the limit change and the swap
    /// happen while the governor admits nothing.
    pub fn reload_thresholds(&self, thresholds: SafetyThresholds) -> Result<()> {
        thresholds
            .validate()
            .map_err(|e| PerceptionError::Config(format!("Invalid thresholds: {}", e)))?;

        let limit = thresholds.max_concurrent_infer;
        let swapped = self.governor.reconfigure_if_idle(limit, || {
            *self.thresholds.write() = Arc::new(thresholds);
        });

        if swapped.is_none() {
            let in_flight = self.governor.in_flight();
            warn!("Threshold reload refused with {} search(es) in flight", in_flight);
            return Err(PerceptionError::ReloadRejected(format!(
                "{} search(es) in flight",
                in_flight
            )));
        }

        info!("Safety thresholds reloaded");
        Ok(())
    }

    /// Detect and classify hazards in `frame`
    pub async fn detect_objects(&self, frame: &Frame) -> Result<Vec<Hazard>> {
        let thresholds = self.thresholds();
        self.detection.detect_objects(frame, &thresholds).await
    }

    /// Embed an image region, e.g. while teaching a new object
    pub async fn generate_embedding(&self, region: &RgbaImage) -> Result<Embedding> {
        self.embedding.generate_embedding(region).await
    }

    /// Look for the object described by `target` in `frame`
    pub async fn search_for_item(&self, frame: &Frame, target: &Embedding) -> Result<SearchOutcome> {
        let thresholds = self.thresholds();
        self.search.search_for_item(frame, target, &thresholds).await
    }

    pub fn summary(&self, name: &str) -> MetricSummary {
        self.metrics.summary(name)
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn governor(&self) -> &InferenceGovernor {
        &self.governor
    }

    /// Pull-based status for diagnostics collaborators
    pub fn diagnostics(&self) -> serde_json::Value {
        json!({
            "detector_ready": self.detector_ready(),
            "embedder_ready": self.embedder_ready(),
            "in_flight": self.governor.in_flight(),
            "max_concurrent_infer": self.governor.limit(),
            "thresholds": &*self.thresholds(),
            "metrics": self.metrics.snapshot(),
        })
    }
}
