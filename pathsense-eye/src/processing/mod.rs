//! Perception processing pipelines

pub mod classifier;
pub mod detection;
pub mod embedding;
pub mod governor;
pub mod search;

pub use classifier::{coco_to_hazard, distance_of, lane_of, Distance, HazardType, Lane};
pub use detection::{Detection, DetectionPipeline, Hazard};
pub use embedding::EmbeddingGenerator;
pub use governor::{InferenceGovernor, InferencePermit};
pub use search::{ItemHit, ProximitySearch, SearchOutcome, MIN_CROP_SIDE_PX};

use crate::error::CapabilityError;
use std::future::Future;
use std::time::Duration;

/// Await a capability call, failing with `Timeout` once `deadline` passes
pub(crate) async fn with_deadline<T, F>(
    call: F,
    deadline: Option<Duration>,
) -> Result<T, CapabilityError>
where
    F: Future<Output = Result<T, CapabilityError>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| CapabilityError::Timeout(limit))?,
        None => call.await,
    }
}
