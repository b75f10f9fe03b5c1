//! Region embedding

use crate::error::{Capability, CapabilityError, PerceptionError, Result};
use crate::metrics::{MetricsRegistry, EMBED_MS};
use crate::models::{EmbedOptions, Embedder, Embedding, ModelSlot};
use crate::processing::with_deadline;
use crate::utils::resize_region;
use image::RgbaImage;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub struct EmbeddingGenerator {
    embedder: Arc<ModelSlot<dyn Embedder>>,
    metrics: Arc<MetricsRegistry>,
    inference_timeout: Option<Duration>,
}

impl EmbeddingGenerator {
    pub fn new(embedder: Arc<ModelSlot<dyn Embedder>>, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            embedder,
            metrics,
            inference_timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.inference_timeout = timeout;
        self
    }

    /// Resize `region` to the embedder's input size and embed it with mean
    /// pooling. The result is L2-normalized; `embed_ms` is recorded on
    /// success only.
    pub async fn generate_embedding(&self, region: &RgbaImage) -> Result<Embedding> {
        let embedder = self.embedder.get()?;

        if region.width() == 0 || region.height() == 0 {
            return Err(PerceptionError::InvalidFrame(
                "cannot embed an empty region".to_string(),
            ));
        }

        let input_size = embedder.input_size();
        if input_size.0 == 0 || input_size.1 == 0 {
            return Err(PerceptionError::from_capability(
                Capability::Embedder,
                CapabilityError::Malformed(format!("input size {:?}", input_size)),
            ));
        }

        let started = Instant::now();
        let input = resize_region(region, input_size);

        let raw = with_deadline(
            embedder.embed(&input, EmbedOptions::default()),
            self.inference_timeout,
        )
        .await
        .map_err(|e| PerceptionError::from_capability(Capability::Embedder, e))?;

        let dimension = raw.len();
        let embedding = Embedding::normalized(raw).ok_or_else(|| {
            warn!("Embedder returned unusable vector of length {}", dimension);
            PerceptionError::from_capability(
                Capability::Embedder,
                CapabilityError::Malformed(
                    "embedding is empty, non-finite or all zero".to_string(),
                ),
            )
        })?;

        self.metrics
            .observe(EMBED_MS, started.elapsed().as_secs_f64() * 1000.0);
        debug!("Embedded {}x{} region", region.width(), region.height());
        Ok(embedding)
    }
}
