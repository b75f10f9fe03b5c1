//! Feature embedder capability and embedding vectors

use crate::error::CapabilityError;
use crate::utils::l2_normalize;
use async_trait::async_trait;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// How token features are reduced to a single vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pooling {
    Mean,
    Cls,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedOptions {
    pub pooling: Pooling,
    pub normalize: bool,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            pooling: Pooling::Mean,
            normalize: true,
        }
    }
}

/// Image feature extractor (CLIP, DINO, ...)
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Fixed input resolution `(width, height)` regions are resized to
    fn input_size(&self) -> (u32, u32);

    /// Embed a region already resized to `input_size()`
    async fn embed(
        &self,
        region: &RgbaImage,
        options: EmbedOptions,
    ) -> Result<Vec<f32>, CapabilityError>;
}

/// Fixed-length, L2-normalized feature vector.
///
/// Reference embeddings are captured while teaching an object and persisted
/// by the caller; query embeddings are computed per candidate region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    values: Vec<f32>,
}

impl Embedding {
    /// Wrap values as-is, e.g. a reference restored from storage.
    ///
    /// Nothing is checked here; item search refuses a target that is not
    /// [`is_usable`](Self::is_usable).
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Non-empty, every component finite, and not the zero vector
    pub fn is_usable(&self) -> bool {
        !self.values.is_empty()
            && self.values.iter().all(|v| v.is_finite())
            && self.values.iter().any(|v| *v != 0.0)
    }

    /// L2-normalize `values`. `None` for empty, non-finite or all-zero input.
    pub fn normalized(mut values: Vec<f32>) -> Option<Self> {
        if values.is_empty() || values.iter().any(|v| !v.is_finite()) {
            return None;
        }
        if !l2_normalize(&mut values) {
            return None;
        }
        Some(Self { values })
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.values
    }
}
