//! Rolling latency telemetry

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use tracing::warn;

pub const DEFAULT_CAPACITY: usize = 128;

pub const DETECT_MS: &str = "detect_ms";
pub const EMBED_MS: &str = "embed_ms";
pub const SEARCH_MS: &str = "search_ms";

/// Percentile summary of one buffer. `n == 0` means no data, not a zero
/// measurement.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricSummary {
    pub p95: f64,
    pub avg: f64,
    pub n: usize,
}

/// Named, capped FIFO sample buffers.
///
/// Owned by the perception core rather than living in a global so that
/// each core (and each test) gets an isolated view. Samples are also
/// forwarded to the `metrics` facade; they go nowhere unless the host
/// installs a recorder.
pub struct MetricsRegistry {
    capacity: usize,
    buffers: RwLock<HashMap<String, VecDeque<f64>>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            buffers: RwLock::new(HashMap::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn observe(&self, name: &str, value: f64) {
        self.observe_with_capacity(name, value, self.capacity);
    }

    /// Append `value`, evicting the oldest samples once the buffer holds
    /// more than `capacity`.
    pub fn observe_with_capacity(&self, name: &str, value: f64, capacity: usize) {
        if !value.is_finite() {
            warn!("Dropping non-finite sample for {}", name);
            return;
        }

        let capacity = capacity.max(1);
        {
            let mut buffers = self.buffers.write();
            let buffer = buffers.entry(name.to_string()).or_default();
            buffer.push_back(value);
            while buffer.len() > capacity {
                buffer.pop_front();
            }
        }

        ::metrics::histogram!(format!("pathsense_{}", name)).record(value);
    }

    pub fn summary(&self, name: &str) -> MetricSummary {
        let buffers = self.buffers.read();
        match buffers.get(name) {
            Some(buffer) => summarize(buffer),
            None => MetricSummary::default(),
        }
    }

    /// Summaries for every buffer, ordered by name
    pub fn snapshot(&self) -> BTreeMap<String, MetricSummary> {
        self.buffers
            .read()
            .iter()
            .map(|(name, buffer)| (name.clone(), summarize(buffer)))
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.buffers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Current samples, oldest first
    pub fn samples(&self, name: &str) -> Vec<f64> {
        self.buffers
            .read()
            .get(name)
            .map(|buffer| buffer.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn reset(&self) {
        self.buffers.write().clear();
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn summarize(buffer: &VecDeque<f64>) -> MetricSummary {
    let n = buffer.len();
    if n == 0 {
        return MetricSummary::default();
    }

    let mut sorted: Vec<f64> = buffer.iter().copied().collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let idx = (0.95 * (n - 1) as f64).floor() as usize;
    let avg = sorted.iter().sum::<f64>() / n as f64;

    MetricSummary {
        p95: sorted[idx],
        avg,
        n,
    }
}
