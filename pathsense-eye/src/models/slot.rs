//! Ready/NotReady holder for an asynchronously loaded capability

use crate::error::{Capability, PerceptionError, Result};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

/// Load state of a capability
pub enum ModelState<T: ?Sized> {
    Ready(Arc<T>),
    NotReady,
}

impl<T: ?Sized> Clone for ModelState<T> {
    fn clone(&self) -> Self {
        match self {
            ModelState::Ready(model) => ModelState::Ready(model.clone()),
            ModelState::NotReady => ModelState::NotReady,
        }
    }
}

/// Slot a collaborator fills once its model finishes loading.
///
/// Callers resolve the slot once per call with [`ModelSlot::get`] and hold
/// the returned `Arc` for the rest of that call, so a concurrent `clear`
/// never pulls the model out from under an in-flight inference.
pub struct ModelSlot<T: ?Sized> {
    capability: Capability,
    state: RwLock<ModelState<T>>,
}

impl<T: ?Sized> ModelSlot<T> {
    pub fn not_ready(capability: Capability) -> Self {
        Self {
            capability,
            state: RwLock::new(ModelState::NotReady),
        }
    }

    pub fn ready(capability: Capability, model: Arc<T>) -> Self {
        Self {
            capability,
            state: RwLock::new(ModelState::Ready(model)),
        }
    }

    pub fn install(&self, model: Arc<T>) {
        *self.state.write() = ModelState::Ready(model);
        info!("{} capability installed", self.capability);
    }

    pub fn clear(&self) {
        *self.state.write() = ModelState::NotReady;
        info!("{} capability cleared", self.capability);
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.state.read(), ModelState::Ready(_))
    }

    pub fn state(&self) -> ModelState<T> {
        self.state.read().clone()
    }

    pub fn get(&self) -> Result<Arc<T>> {
        match &*self.state.read() {
            ModelState::Ready(model) => Ok(model.clone()),
            ModelState::NotReady => Err(PerceptionError::ModelNotReady(self.capability)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Named: Send + Sync {
        fn name(&self) -> &str;
    }

    struct Stub;

    impl Named for Stub {
        fn name(&self) -> &str {
            "stub"
        }
    }

    #[test]
    fn test_slot_starts_not_ready() {
        let slot: ModelSlot<dyn Named> = ModelSlot::not_ready(Capability::Detector);
        assert!(!slot.is_ready());
        assert!(matches!(
            slot.get(),
            Err(PerceptionError::ModelNotReady(Capability::Detector))
        ));
    }

    #[test]
    fn test_slot_install_and_clear() {
        let slot: ModelSlot<dyn Named> = ModelSlot::not_ready(Capability::Embedder);
        slot.install(Arc::new(Stub));
        assert!(slot.is_ready());
        assert_eq!(slot.get().unwrap().name(), "stub");

        let held = slot.get().unwrap();
        slot.clear();
        assert!(!slot.is_ready());
        assert!(matches!(slot.state(), ModelState::NotReady));
        // Handle resolved before clear stays usable
        assert_eq!(held.name(), "stub");
    }
}
