//! Proximity search for a taught object
//!
//! Detections double as region proposals: the highest-confidence boxes are
//! cropped, embedded and compared against the reference embedding. Embedding
//! is the expensive step, so `TOPK_ITEM_CANDIDATES` bounds the number of
//! embedder calls per search, not the number of detections.

use crate::config::SafetyThresholds;
use crate::error::{PerceptionError, Result};
use crate::frame::Frame;
use crate::metrics::{MetricsRegistry, SEARCH_MS};
use crate::models::Embedding;
use crate::processing::classifier::{Distance, Lane};
use crate::processing::detection::{Detection, DetectionPipeline};
use crate::processing::embedding::EmbeddingGenerator;
use crate::processing::governor::InferenceGovernor;
use crate::utils::cosine_sim;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Crops narrower or shorter than this are not worth embedding
pub const MIN_CROP_SIDE_PX: f32 = 8.0;

/// Best candidate matching the reference embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemHit {
    pub detection: Detection,
    pub lane: Lane,
    pub distance: Distance,
    pub similarity: f32,
}

/// Result of one search call. Neither `NoMatch` nor `Busy` is an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SearchOutcome {
    Hit(ItemHit),
    /// Nothing cleared `MIN_ITEM_COSINE`, or there were no usable candidates
    NoMatch,
    /// The governor declined the request; skip this frame
    Busy,
}

impl SearchOutcome {
    pub fn hit(&self) -> Option<&ItemHit> {
        match self {
            SearchOutcome::Hit(hit) => Some(hit),
            _ => None,
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, SearchOutcome::Busy)
    }
}

pub struct ProximitySearch {
    detection: Arc<DetectionPipeline>,
    embedding: Arc<EmbeddingGenerator>,
    governor: Arc<InferenceGovernor>,
    metrics: Arc<MetricsRegistry>,
}

impl ProximitySearch {
    pub fn new(
        detection: Arc<DetectionPipeline>,
        embedding: Arc<EmbeddingGenerator>,
        governor: Arc<InferenceGovernor>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            detection,
            embedding,
            governor,
            metrics,
        }
    }

    /// Find the candidate in `frame` most similar to `target`.
    ///
    /// Candidates are visited in descending detector confidence and a later
    /// candidate replaces the current best only when strictly more similar,
    /// so ties go to the more confident detection.
    ///
    /// A target that is empty, zero or holds a non-finite component is
    /// rejected with `InvalidEmbedding` before any inference runs.
    pub async fn search_for_item(
        &self,
        frame: &Frame,
        target: &Embedding,
        thresholds: &SafetyThresholds,
    ) -> Result<SearchOutcome> {
        if !target.is_usable() {
            warn!(
                "Refusing item search with unusable reference embedding (dimension {})",
                target.dimension()
            );
            return Err(PerceptionError::InvalidEmbedding(
                "reference embedding is empty, zero or non-finite".to_string(),
            ));
        }

        let _permit = match self.governor.try_acquire() {
            Some(permit) => permit,
            None => {
                debug!("Item search skipped, inference slot busy");
                return Ok(SearchOutcome::Busy);
            }
        };
        let started = Instant::now();

        let mut candidates = self.detection.detect_objects(frame, thresholds).await?;
        // Stable sort keeps detector order among equal scores
        candidates.sort_by(|a, b| b.detection.score.total_cmp(&a.detection.score));
        candidates.truncate(thresholds.topk_item_candidates);

        let mut best: Option<ItemHit> = None;
        for candidate in candidates {
            let bbox = candidate.detection.bbox;
            if bbox.width < MIN_CROP_SIDE_PX || bbox.height < MIN_CROP_SIDE_PX {
                debug!(
                    "Skipping {} candidate, crop {:.0}x{:.0} too small",
                    candidate.detection.class_name, bbox.width, bbox.height
                );
                continue;
            }

            let region = match frame.crop(&bbox) {
                Some(region) => region,
                None => continue,
            };

            let query = self.embedding.generate_embedding(&region).await?;
            let similarity = cosine_sim(query.as_slice(), target.as_slice());
            debug!(
                "Candidate {} (score {:.2}) similarity {:.3}",
                candidate.detection.class_name, candidate.detection.score, similarity
            );

            if !similarity.is_finite() || similarity < thresholds.min_item_cosine {
                continue;
            }
            let similarity = similarity.min(1.0);

            let replace = match &best {
                Some(current) => similarity > current.similarity,
                None => true,
            };
            if replace {
                best = Some(ItemHit {
                    detection: candidate.detection,
                    lane: candidate.lane,
                    distance: candidate.distance,
                    similarity,
                });
            }
        }

        self.metrics
            .observe(SEARCH_MS, started.elapsed().as_secs_f64() * 1000.0);

        Ok(match best {
            Some(hit) => {
                debug!(
                    "Item match: {} at similarity {:.3}",
                    hit.detection.class_name, hit.similarity
                );
                SearchOutcome::Hit(hit)
            }
            None => SearchOutcome::NoMatch,
        })
    }
}
