//! Runtime-checked accessor
//!
//! [`DynContext`] carries the same two policy flags as [`crate::Context`], but
//! as plain booleans chosen at runtime, for example from configuration. What
//! the typed accessor rejects at compile time is checked here instead: a
//! default that does not match `default_is_factory` is refused at
//! construction, and writing absent to a non-nullable accessor is refused at
//! the write.

use crate::error::ContextError;
use crate::key::ContextKey;
use crate::policy::{ContextPolicy, ContextValue, Fallback, Producer};
use crate::scope::{self, Scope};
use std::fmt;
use std::sync::Arc;

/// Default declared for a runtime-checked accessor
pub enum DefaultValue<T> {
    /// No default.
    Absent,
    Value(T),
    Factory(Producer<T>),
}

impl<T> DefaultValue<T> {
    pub fn factory<F>(producer: F) -> Self
    where
        F: Fn() -> Option<T> + Send + Sync + 'static,
    {
        DefaultValue::Factory(Arc::new(producer))
    }

    fn kind(&self) -> &'static str {
        match self {
            DefaultValue::Absent => "absent",
            DefaultValue::Value(_) => "value",
            DefaultValue::Factory(_) => "factory",
        }
    }
}

impl<T: Clone> Clone for DefaultValue<T> {
    fn clone(&self) -> Self {
        match self {
            DefaultValue::Absent => DefaultValue::Absent,
            DefaultValue::Value(value) => DefaultValue::Value(value.clone()),
            DefaultValue::Factory(producer) => DefaultValue::Factory(producer.clone()),
        }
    }
}

impl<T> fmt::Debug for DefaultValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DefaultValue::{}", self.kind())
    }
}

/// Construction options for [`DynContext`]
#[derive(Debug, Clone)]
pub struct ContextOptions<T> {
    pub key: ContextKey<T>,
    pub default_value: DefaultValue<T>,
    pub nullable_allowed: bool,
    pub default_is_factory: bool,
}

impl<T: ContextValue> ContextOptions<T> {
    /// Non-nullable, eager, no default.
    pub fn new(key: impl Into<ContextKey<T>>) -> Self {
        Self {
            key: key.into(),
            default_value: DefaultValue::Absent,
            nullable_allowed: false,
            default_is_factory: false,
        }
    }

    pub fn default_value(mut self, default_value: DefaultValue<T>) -> Self {
        self.default_value = default_value;
        self
    }

    pub fn nullable_allowed(mut self, allowed: bool) -> Self {
        self.nullable_allowed = allowed;
        self
    }

    pub fn default_is_factory(mut self, is_factory: bool) -> Self {
        self.default_is_factory = is_factory;
        self
    }

    pub fn policy(mut self, policy: ContextPolicy) -> Self {
        self.nullable_allowed = policy.nullable_allowed;
        self.default_is_factory = policy.default_is_factory;
        self
    }
}

/// Default after validation: absent and plain values collapse to an
/// optional eager value.
enum StoredDefault<T> {
    Eager(Option<T>),
    Factory(Producer<T>),
}

impl<T: Clone> Clone for StoredDefault<T> {
    fn clone(&self) -> Self {
        match self {
            StoredDefault::Eager(value) => StoredDefault::Eager(value.clone()),
            StoredDefault::Factory(producer) => StoredDefault::Factory(producer.clone()),
        }
    }
}

/// Accessor whose policy is validated at runtime
#[derive(Clone)]
pub struct DynContext<T: ContextValue> {
    key: ContextKey<T>,
    default_value: StoredDefault<T>,
    policy: ContextPolicy,
}

impl<T: ContextValue> DynContext<T> {
    /// Fails with [`ContextError::InvalidPolicyUsage`] when the declared
    /// default does not match `default_is_factory`.
    pub fn new(options: ContextOptions<T>) -> Result<Self, ContextError> {
        let ContextOptions {
            key,
            default_value,
            nullable_allowed,
            default_is_factory,
        } = options;

        let default_value = match (default_value, default_is_factory) {
            (DefaultValue::Absent, _) => StoredDefault::Eager(None),
            (DefaultValue::Value(value), false) => StoredDefault::Eager(Some(value)),
            (DefaultValue::Factory(producer), true) => StoredDefault::Factory(producer),
            (DefaultValue::Value(_), true) => {
                return Err(ContextError::InvalidPolicyUsage {
                    key: key.to_string(),
                    reason: "default_is_factory requires a producer default, got a plain value"
                        .to_string(),
                })
            }
            (DefaultValue::Factory(_), false) => {
                return Err(ContextError::InvalidPolicyUsage {
                    key: key.to_string(),
                    reason: "producer default declared without default_is_factory".to_string(),
                })
            }
        };

        Ok(Self {
            key,
            default_value,
            policy: ContextPolicy {
                nullable_allowed,
                default_is_factory,
            },
        })
    }

    pub fn key(&self) -> &ContextKey<T> {
        &self.key
    }

    pub fn policy(&self) -> ContextPolicy {
        self.policy
    }

    /// Registers `value` in the current scope. Absent is refused with
    /// [`ContextError::ContractViolation`] unless the accessor is nullable.
    pub fn write(&self, value: Option<T>) -> Result<(), ContextError> {
        self.check_write(&value)?;
        scope::register_current(&self.key, value);
        Ok(())
    }

    pub fn write_in(&self, scope: &Scope, value: Option<T>) -> Result<(), ContextError> {
        self.check_write(&value)?;
        scope.register(&self.key, value);
        Ok(())
    }

    pub fn read(&self) -> Result<Option<T>, ContextError> {
        let resolved = scope::lookup_current(&self.key, self.fallback());
        self.finish(resolved)
    }

    pub fn read_in(&self, scope: &Scope) -> Result<Option<T>, ContextError> {
        let resolved = scope.lookup(&self.key, self.fallback());
        self.finish(resolved)
    }

    fn check_write(&self, value: &Option<T>) -> Result<(), ContextError> {
        if value.is_none() && !self.policy.nullable_allowed {
            return Err(ContextError::ContractViolation {
                key: self.key.to_string(),
            });
        }
        Ok(())
    }

    fn fallback(&self) -> Fallback<'_, T> {
        match &self.default_value {
            StoredDefault::Eager(value) => Fallback::Value(value),
            StoredDefault::Factory(producer) => Fallback::Factory(producer.as_ref()),
        }
    }

    fn finish(&self, resolved: Option<T>) -> Result<Option<T>, ContextError> {
        if resolved.is_none() && !self.policy.nullable_allowed {
            return Err(ContextError::missing(&self.key));
        }
        Ok(resolved)
    }
}

impl<T: ContextValue> fmt::Debug for DynContext<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynContext")
            .field("key", &self.key)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
