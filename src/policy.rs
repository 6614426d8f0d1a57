//! Accessor policies
//!
//! Two independent flags shape an accessor: whether an absent value is a
//! legitimate result (`Required` / `Nullable`) and whether the default is a
//! value or a producer (`Eager` / `Factory`). Each flag is a sealed marker
//! type whose associated types derive the accessor's read and write
//! signatures.

use crate::error::ContextError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

mod sealed {
    pub trait Sealed {}
}

/// Values that can be relayed through a context.
pub trait ContextValue: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> ContextValue for T {}

/// Zero-argument producer used as a factory default.
pub type Producer<T> = Arc<dyn Fn() -> Option<T> + Send + Sync>;

/// Fallback applied by a lookup that finds no registration.
pub enum Fallback<'a, T> {
    Value(&'a Option<T>),
    Factory(&'a (dyn Fn() -> Option<T> + Send + Sync)),
}

impl<T: Clone> Fallback<'_, T> {
    pub fn is_factory(&self) -> bool {
        matches!(self, Fallback::Factory(_))
    }

    /// Factories run once per call.
    pub fn produce(&self) -> Option<T> {
        match self {
            Fallback::Value(value) => (*value).clone(),
            Fallback::Factory(factory) => factory(),
        }
    }
}

/// Nullability flag
pub trait Nullability: sealed::Sealed + Send + Sync + 'static {
    const ALLOWS_NULL: bool;

    /// Parameter type of `write`.
    type Write<T>;

    /// Result type of `read`.
    type Read<T>;

    fn into_stored<T>(value: Self::Write<T>) -> Option<T>;

    fn finish<T>(resolved: Option<T>, key: &dyn fmt::Display) -> Self::Read<T>;
}

/// Absent is a contract violation; `read` yields `Result<T, ContextError>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Required {}

/// Absent is a legitimate value; `read` yields `Option<T>` and never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nullable {}

impl sealed::Sealed for Required {}
impl sealed::Sealed for Nullable {}

impl Nullability for Required {
    const ALLOWS_NULL: bool = false;

    type Write<T> = T;
    type Read<T> = Result<T, ContextError>;

    fn into_stored<T>(value: T) -> Option<T> {
        Some(value)
    }

    fn finish<T>(resolved: Option<T>, key: &dyn fmt::Display) -> Result<T, ContextError> {
        resolved.ok_or_else(|| ContextError::missing(key))
    }
}

impl Nullability for Nullable {
    const ALLOWS_NULL: bool = true;

    type Write<T> = Option<T>;
    type Read<T> = Option<T>;

    fn into_stored<T>(value: Option<T>) -> Option<T> {
        value
    }

    fn finish<T>(resolved: Option<T>, _key: &dyn fmt::Display) -> Option<T> {
        resolved
    }
}

/// Default-mode flag
pub trait DefaultMode: sealed::Sealed + Send + Sync + 'static {
    const IS_FACTORY: bool;

    /// Stored default: a plain optional value or a producer.
    type Default<T: ContextValue>: Clone + Send + Sync;

    fn fallback<T: ContextValue>(default: &Self::Default<T>) -> Fallback<'_, T>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eager {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Factory {}

impl sealed::Sealed for Eager {}
impl sealed::Sealed for Factory {}

impl DefaultMode for Eager {
    const IS_FACTORY: bool = false;

    type Default<T: ContextValue> = Option<T>;

    fn fallback<T: ContextValue>(default: &Option<T>) -> Fallback<'_, T> {
        Fallback::Value(default)
    }
}

impl DefaultMode for Factory {
    const IS_FACTORY: bool = true;

    type Default<T: ContextValue> = Producer<T>;

    fn fallback<T: ContextValue>(default: &Producer<T>) -> Fallback<'_, T> {
        Fallback::Factory(default.as_ref())
    }
}

/// Runtime view of both flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextPolicy {
    #[serde(default)]
    pub nullable_allowed: bool,
    #[serde(default)]
    pub default_is_factory: bool,
}

impl ContextPolicy {
    pub fn of<N: Nullability, D: DefaultMode>() -> Self {
        Self {
            nullable_allowed: N::ALLOWS_NULL,
            default_is_factory: D::IS_FACTORY,
        }
    }
}

/// Static-typing helper for accessors declared without a default.
///
/// Always `None`; it only lets `T` be named at the declaration site, as in
/// `Context::new(key, value_type::<String>())`.
pub const fn value_type<T>() -> Option<T> {
    None
}
