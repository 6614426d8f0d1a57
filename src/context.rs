//! Typed Context Accessor
//!
//! A [`Context`] binds a key to a value type and to two policy flags fixed at
//! declaration:
//!
//! | nullability | default  | `write` takes | `read` returns             |
//! |-------------|----------|---------------|----------------------------|
//! | `Required`  | `Eager`  | `T`           | `Result<T, ContextError>`  |
//! | `Required`  | `Factory`| `T`           | `Result<T, ContextError>`  |
//! | `Nullable`  | `Eager`  | `Option<T>`   | `Option<T>`                |
//! | `Nullable`  | `Factory`| `Option<T>`   | `Option<T>`                |
//!
//! A required accessor that resolves to nothing fails at the read site with
//! [`ContextError::MissingContextValue`] instead of handing back a latent
//! absent value.
//!
//! ```
//! use scoped_context::{Context, ContextKey, Host};
//!
//! let depth = Context::new(ContextKey::unique("depth"), Some(1u32));
//! let host = Host::new();
//! let provider = host.mount("Provider");
//! let consumer = provider.child("Consumer");
//!
//! assert_eq!(provider.enter(|| depth.read()), Ok(1));
//! provider.enter(|| depth.write(2));
//! assert_eq!(consumer.enter(|| depth.read()), Ok(2));
//! ```

use crate::key::ContextKey;
use crate::policy::{
    ContextPolicy, ContextValue, DefaultMode, Eager, Factory, Nullability, Nullable, Producer,
    Required,
};
use crate::scope::{self, Scope};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Typed accessor over one propagation slot
pub struct Context<T: ContextValue, N: Nullability = Required, D: DefaultMode = Eager> {
    key: ContextKey<T>,
    default_value: D::Default<T>,
    _policy: PhantomData<fn() -> (N, D)>,
}

impl<T: ContextValue> Context<T> {
    /// Required accessor with an eager default. `None` declares no default,
    /// usually spelled `value_type::<T>()`.
    pub fn new(key: impl Into<ContextKey<T>>, default_value: Option<T>) -> Self {
        Self::from_parts(key.into(), default_value)
    }

    /// Required accessor without a default.
    pub fn without_default(key: impl Into<ContextKey<T>>) -> Self {
        Self::from_parts(key.into(), None)
    }
}

impl<T: ContextValue> Context<T, Nullable> {
    pub fn nullable(key: impl Into<ContextKey<T>>, default_value: Option<T>) -> Self {
        Self::from_parts(key.into(), default_value)
    }
}

impl<T: ContextValue> Context<T, Required, Factory> {
    /// Required accessor whose default is produced afresh on every
    /// unresolved read.
    pub fn with_factory<F>(key: impl Into<ContextKey<T>>, producer: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::from_parts(key.into(), Arc::new(move || Some(producer())) as Producer<T>)
    }

    /// Like [`Context::with_factory`], but the producer may come up empty, in
    /// which case the read fails.
    pub fn with_fallible_factory<F>(key: impl Into<ContextKey<T>>, producer: F) -> Self
    where
        F: Fn() -> Option<T> + Send + Sync + 'static,
    {
        Self::from_parts(key.into(), Arc::new(producer) as Producer<T>)
    }
}

impl<T: ContextValue> Context<T, Nullable, Factory> {
    pub fn nullable_with_factory<F>(key: impl Into<ContextKey<T>>, producer: F) -> Self
    where
        F: Fn() -> Option<T> + Send + Sync + 'static,
    {
        Self::from_parts(key.into(), Arc::new(producer) as Producer<T>)
    }
}

impl<T, N, D> Context<T, N, D>
where
    T: ContextValue,
    N: Nullability,
    D: DefaultMode,
{
    fn from_parts(key: ContextKey<T>, default_value: D::Default<T>) -> Self {
        Self {
            key,
            default_value,
            _policy: PhantomData,
        }
    }

    pub fn key(&self) -> &ContextKey<T> {
        &self.key
    }

    pub fn policy(&self) -> ContextPolicy {
        ContextPolicy::of::<N, D>()
    }

    /// Registers `value` in the current scope for all of its descendants.
    ///
    /// Without an active component scope the write is ignored with a warning.
    pub fn write(&self, value: N::Write<T>) {
        scope::register_current(&self.key, N::into_stored(value));
    }

    pub fn write_in(&self, scope: &Scope, value: N::Write<T>) {
        scope.register(&self.key, N::into_stored(value));
    }

    /// Resolves the nearest ancestor registration, then the default.
    ///
    /// Without an active scope nothing resolves and the default is not
    /// applied, so required accessors fail.
    pub fn read(&self) -> N::Read<T> {
        let resolved = scope::lookup_current(&self.key, D::fallback(&self.default_value));
        N::finish(resolved, &self.key)
    }

    pub fn read_in(&self, scope: &Scope) -> N::Read<T> {
        let resolved = scope.lookup(&self.key, D::fallback(&self.default_value));
        N::finish(resolved, &self.key)
    }
}

impl<T, N, D> Clone for Context<T, N, D>
where
    T: ContextValue,
    N: Nullability,
    D: DefaultMode,
{
    fn clone(&self) -> Self {
        Self::from_parts(self.key.clone(), self.default_value.clone())
    }
}

impl<T, N, D> fmt::Debug for Context<T, N, D>
where
    T: ContextValue,
    N: Nullability,
    D: DefaultMode,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("key", &self.key)
            .field("policy", &self.policy())
            .finish_non_exhaustive()
    }
}
