//! Model capabilities consumed by the perception core

pub mod detector;
pub mod embedder;
pub mod slot;

pub use detector::{Detector, RawDetection};
pub use embedder::{EmbedOptions, Embedder, Embedding, Pooling};
pub use slot::{ModelSlot, ModelState};
