//! pathsense-eye: on-device perception core for navigation guidance
//!
//! Turns a camera frame into a list of classified hazards (type, lane,
//! distance) and, when a taught reference embedding is supplied, into an
//! optional match against that object. The detector and embedder models are
//! consumed as opaque capabilities; this crate owns the orchestration around
//! them: hazard classification, candidate re-ranking, single-slot
//! backpressure and rolling latency telemetry.

pub mod config;
pub mod error;
pub mod frame;
pub mod metrics;
pub mod models;
pub mod perception;
pub mod processing;
mod utils;

pub use config::{PerceptionConfig, SafetyThresholds};
pub use error::{Capability, CapabilityError, PerceptionError};
pub use frame::{Frame, PixelBox};
pub use metrics::{MetricSummary, MetricsRegistry};
pub use models::{Detector, Embedder, Embedding, ModelSlot, RawDetection};
pub use perception::PerceptionCore;
pub use processing::{
    Detection, Distance, Hazard, HazardType, ItemHit, Lane, SearchOutcome,
};
pub use utils::cosine_sim;
