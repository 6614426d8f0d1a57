//! Per-scope registration frame

use crate::key::SlotKey;
use crate::policy::ContextValue;
use std::any::Any;
use std::collections::HashMap;
use tracing::error;

/// Mapping of slot to registered value.
///
/// Each entry stores an `Option<T>`; an explicit absent registration is still
/// a registration and shadows everything above it.
#[derive(Default)]
pub(crate) struct Frame {
    slots: HashMap<SlotKey, Box<dyn Any + Send + Sync>>,
}

impl Frame {
    /// Returns true when an earlier registration in this frame was replaced.
    pub(crate) fn insert<T: ContextValue>(&mut self, slot: SlotKey, value: Option<T>) -> bool {
        self.slots.insert(slot, Box::new(value)).is_some()
    }

    /// Outer `None`: nothing registered here. Inner `None`: absent registered.
    pub(crate) fn get<T: ContextValue>(&self, slot: &SlotKey) -> Option<Option<T>> {
        let stored = self.slots.get(slot)?;
        match stored.downcast_ref::<Option<T>>() {
            Some(value) => Some(value.clone()),
            None => {
                error!(slot = ?slot, "Registered value does not match the slot's value type");
                None
            }
        }
    }

    pub(crate) fn contains(&self, slot: &SlotKey) -> bool {
        self.slots.contains_key(slot)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}
