//! Utility functions for vector math and region preparation

use image::imageops::{self, FilterType};
use image::RgbaImage;

const COSINE_EPSILON: f32 = 1e-8;

/// Cosine similarity `dot(a, b) / (|a| * |b| + 1e-8)`.
///
/// Computed over the common prefix when lengths differ.
pub fn cosine_sim(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len().min(b.len());
    let (a, b) = (&a[..n], &b[..n]);

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt() + COSINE_EPSILON)
}

/// Scale `values` to unit L2 norm in place. Returns false, leaving the input
/// untouched, when the norm is zero or not finite.
pub fn l2_normalize(values: &mut [f32]) -> bool {
    let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm <= 0.0 || !norm.is_finite() {
        return false;
    }
    for v in values.iter_mut() {
        *v /= norm;
    }
    true
}

/// Resize a region to the embedder's fixed input resolution
pub fn resize_region(region: &RgbaImage, size: (u32, u32)) -> RgbaImage {
    if region.dimensions() == size {
        return region.clone();
    }
    imageops::resize(region, size.0, size.1, FilterType::Triangle)
}
