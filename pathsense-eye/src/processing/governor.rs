//! Single-slot backpressure for expensive inference

use std::sync::atomic::{AtomicUsize, Ordering};

pub const DEFAULT_MAX_CONCURRENT: usize = 1;

/// `in_flight` value while the governor is being reconfigured. Every
/// `try_acquire` sees it as full.
const RECONFIGURING: usize = usize::MAX;

/// Bounded in-flight counter. Requests over the limit are rejected
/// immediately; nothing is queued and nothing blocks.
pub struct InferenceGovernor {
    in_flight: AtomicUsize,
    limit: AtomicUsize,
}

/// Held for the duration of one admitted request. Dropping it releases the
/// slot, on success, error or cancellation alike.
#[must_use = "the slot is released as soon as the permit is dropped"]
pub struct InferencePermit<'a> {
    governor: &'a InferenceGovernor,
}

impl InferenceGovernor {
    pub fn new(limit: usize) -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            limit: AtomicUsize::new(limit.max(1)),
        }
    }

    /// Claim a slot, or `None` if `limit` requests are already running
    pub fn try_acquire(&self) -> Option<InferencePermit<'_>> {
        let mut current = self.in_flight.load(Ordering::Acquire);

        loop {
            // Read after `current` so a finished reconfigure is never judged
            // against the old limit
            let limit = self.limit.load(Ordering::Acquire);
            if current >= limit {
                return None;
            }
            match self.in_flight.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Some(InferencePermit { governor: self }),
                Err(actual) => current = actual,
            }
        }
    }

    pub fn in_flight(&self) -> usize {
        match self.in_flight.load(Ordering::Acquire) {
            RECONFIGURING => 0,
            n => n,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit.load(Ordering::Acquire)
    }

    /// Set a new limit and run `apply`, but only if no request holds a slot.
    ///
    /// All slots are claimed for the duration, so no request can be
    /// admitted between the idle check and the limit change. Returns `None`
    /// without calling `apply` when a request is in flight.
    pub fn reconfigure_if_idle<R>(&self, limit: usize, apply: impl FnOnce() -> R) -> Option<R> {
        self.in_flight
            .compare_exchange(0, RECONFIGURING, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;

        struct Reopen<'a>(&'a AtomicUsize);
        impl Drop for Reopen<'_> {
            fn drop(&mut self) {
                self.0.store(0, Ordering::Release);
            }
        }
        let _reopen = Reopen(&self.in_flight);

        self.limit.store(limit.max(1), Ordering::Release);
        Some(apply())
    }
}

impl Default for InferenceGovernor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT)
    }
}

impl Drop for InferencePermit<'_> {
    fn drop(&mut self) {
        self.governor.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}
