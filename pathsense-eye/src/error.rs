//! Error types for pathsense-eye

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// External model capability consumed by the perception core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Detector,
    Embedder,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Detector => f.write_str("detector"),
            Capability::Embedder => f.write_str("embedder"),
        }
    }
}

/// Failure reported by a Detector or Embedder implementation
#[derive(Error, Debug)]
pub enum CapabilityError {
    #[error("model not ready")]
    NotReady,

    #[error("runtime error: {0}")]
    Runtime(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("malformed output: {0}")]
    Malformed(String),

    #[error("deadline of {0:?} exceeded")]
    Timeout(Duration),
}

impl CapabilityError {
    /// Wrap any runtime error raised by a model backend
    pub fn runtime<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        CapabilityError::Runtime(err.into())
    }
}

#[derive(Error, Debug)]
pub enum PerceptionError {
    #[error("{0} model not ready")]
    ModelNotReady(Capability),

    #[error("{capability} inference failed: {source}")]
    InferenceFailure {
        capability: Capability,
        #[source]
        source: CapabilityError,
    },

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Invalid embedding: {0}")]
    InvalidEmbedding(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Threshold reload rejected: {0}")]
    ReloadRejected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PerceptionError {
    /// Map a capability failure onto the perception taxonomy.
    ///
    /// `NotReady` stays distinct from every other failure so callers can tell
    /// "still warming up" apart from "model is broken".
    pub(crate) fn from_capability(capability: Capability, err: CapabilityError) -> Self {
        match err {
            CapabilityError::NotReady => PerceptionError::ModelNotReady(capability),
            other => PerceptionError::InferenceFailure {
                capability,
                source: other,
            },
        }
    }

    pub fn is_not_ready(&self) -> bool {
        matches!(self, PerceptionError::ModelNotReady(_))
    }
}

pub type Result<T> = std::result::Result<T, PerceptionError>;
