//! Context keys
//!
//! A key names one propagation slot and carries the value type bound to it.
//! Identity keys behave like symbols: every construction yields a fresh slot,
//! even for equal descriptions. Named keys behave like strings: equal names
//! address the same slot, so independently declared accessors sharing a name
//! read and write each other's registrations.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(1);

/// Type-erased slot address used by scope frames.
///
/// Named slots are partitioned by value type, so a shared name can only alias
/// accessors that agree on `T`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum SlotKey {
    Identity(u64),
    Named { name: Arc<str>, value_type: TypeId },
}

/// Key bound to the value type `T`
pub struct ContextKey<T> {
    slot: SlotKey,
    description: Arc<str>,
    _value: PhantomData<fn() -> T>,
}

impl<T: 'static> ContextKey<T> {
    /// Symbol-like key. Never collides with any other key.
    pub fn unique(description: impl Into<Arc<str>>) -> Self {
        Self {
            slot: SlotKey::Identity(NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed)),
            description: description.into(),
            _value: PhantomData,
        }
    }

    /// String-like key. Shares its slot with every other named key of the
    /// same name and value type.
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        let name = name.into();
        Self {
            slot: SlotKey::Named {
                name: name.clone(),
                value_type: TypeId::of::<T>(),
            },
            description: name,
            _value: PhantomData,
        }
    }
}

impl<T> ContextKey<T> {
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_named(&self) -> bool {
        matches!(self.slot, SlotKey::Named { .. })
    }

    pub(crate) fn slot(&self) -> &SlotKey {
        &self.slot
    }
}

impl<T> Clone for ContextKey<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
            description: self.description.clone(),
            _value: PhantomData,
        }
    }
}

impl<T> PartialEq for ContextKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.slot == other.slot
    }
}

impl<T> Eq for ContextKey<T> {}

impl<T> Hash for ContextKey<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.slot.hash(state);
    }
}

impl<T> fmt::Debug for ContextKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextKey")
            .field("slot", &self.slot)
            .field("description", &self.description)
            .finish()
    }
}

/// Identity keys render as `Symbol(description)`, named keys as the bare name.
impl<T> fmt::Display for ContextKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slot {
            SlotKey::Identity(_) => write!(f, "Symbol({})", self.description),
            SlotKey::Named { .. } => f.write_str(&self.description),
        }
    }
}

impl<T: 'static> From<&str> for ContextKey<T> {
    fn from(name: &str) -> Self {
        ContextKey::named(name)
    }
}

impl<T: 'static> From<String> for ContextKey<T> {
    fn from(name: String) -> Self {
        ContextKey::named(name)
    }
}
