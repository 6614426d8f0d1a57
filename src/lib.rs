//! Scoped Context: typed accessors over tree-scoped context propagation
//!
//! Ancestor scopes register values under keys; descendant scopes read the
//! nearest ancestor's registration, or a default when there is none. A
//! [`Context`] binds a key to a value type together with a nullability policy
//! and a default policy, and derives its `read`/`write` signatures from them.

pub mod config;
pub mod context;
pub mod dynamic;
pub mod error;
pub mod key;
pub mod logging;
pub mod policy;
pub mod scope;

pub use context::Context;
pub use dynamic::{ContextOptions, DefaultValue, DynContext};
pub use error::ContextError;
pub use key::ContextKey;
pub use policy::{value_type, ContextPolicy, ContextValue, Eager, Factory, Nullable, Required};
pub use scope::{current_scope, has_active_scope, Host, Scope, ScopeGuard};
