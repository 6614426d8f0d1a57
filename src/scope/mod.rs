//! Scope tree
//!
//! In-process implementation of tree-scoped propagation. A [`Host`] owns the
//! application-level frame; every [`Scope`] mounted below it owns one frame
//! and links to its parent. Registrations made in a scope are visible to its
//! descendants, never to the scope itself, and a nested registration shadows
//! an outer one only inside the nested subtree.
//!
//! The two primitives consumed by accessors are [`Scope::register`] and
//! [`Scope::lookup`] (plus the host equivalents). Lookup walks from the
//! reader's parent toward the host and applies the fallback only when no
//! frame on the way holds the key.

mod current;
mod frame;

pub use current::{current_scope, has_active_scope, ScopeGuard};

use crate::config::{DiagnosticsConfig, HostConfig};
use crate::context::Context;
use crate::key::ContextKey;
use crate::policy::{ContextValue, DefaultMode, Fallback, Nullability};
use current::Active;
use frame::Frame;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

struct ScopeNode {
    id: u64,
    label: Arc<str>,
    /// Host is 0, mounted root scopes are 1.
    depth: usize,
    parent: Option<Arc<ScopeNode>>,
    frame: RwLock<Frame>,
    diagnostics: Arc<DiagnosticsConfig>,
}

impl ScopeNode {
    fn new(
        label: Arc<str>,
        parent: Option<Arc<ScopeNode>>,
        diagnostics: Arc<DiagnosticsConfig>,
    ) -> Arc<Self> {
        let depth = parent.as_ref().map_or(0, |p| p.depth + 1);
        Arc::new(Self {
            id: NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed),
            label,
            depth,
            parent,
            frame: RwLock::new(Frame::default()),
            diagnostics,
        })
    }

    fn register<T: ContextValue>(&self, key: &ContextKey<T>, value: Option<T>) {
        if self.diagnostics.report_shadowing && registered_above(self.parent.as_ref(), key) {
            debug!(
                key = %key,
                scope = %self.label,
                "Registration shadows an ancestor value"
            );
        }
        let replaced = self.frame.write().insert(key.slot().clone(), value);
        trace!(
            key = %key,
            scope = %self.label,
            depth = self.depth,
            replaced,
            "Registered context value"
        );
    }
}

/// Nearest registration at or above `start`.
fn find<T: ContextValue>(start: Option<&Arc<ScopeNode>>, key: &ContextKey<T>) -> Option<Option<T>> {
    let mut cursor = start;
    while let Some(node) = cursor {
        if let Some(value) = node.frame.read().get::<T>(key.slot()) {
            trace!(key = %key, scope = %node.label, depth = node.depth, "Resolved context value");
            return Some(value);
        }
        cursor = node.parent.as_ref();
    }
    None
}

/// Presence check only: no value is cloned and no resolution is traced.
fn registered_above<T: ContextValue>(start: Option<&Arc<ScopeNode>>, key: &ContextKey<T>) -> bool {
    let mut cursor = start;
    while let Some(node) = cursor {
        if node.frame.read().contains(key.slot()) {
            return true;
        }
        cursor = node.parent.as_ref();
    }
    false
}

fn resolve<T: ContextValue>(
    start: Option<&Arc<ScopeNode>>,
    key: &ContextKey<T>,
    fallback: Fallback<'_, T>,
) -> Option<T> {
    match find(start, key) {
        Some(value) => value,
        None => {
            trace!(key = %key, factory = fallback.is_factory(), "Falling back to default");
            fallback.produce()
        }
    }
}

/// Application root. Clones share the same frame.
#[derive(Clone)]
pub struct Host {
    node: Arc<ScopeNode>,
}

impl Default for Host {
    fn default() -> Self {
        Self::new()
    }
}

impl Host {
    pub fn new() -> Self {
        Self::with_config(HostConfig::default())
    }

    pub fn with_config(config: HostConfig) -> Self {
        Self {
            node: ScopeNode::new(config.label.into(), None, Arc::new(config.diagnostics)),
        }
    }

    pub fn label(&self) -> &str {
        &self.node.label
    }

    pub fn diagnostics(&self) -> &DiagnosticsConfig {
        &self.node.diagnostics
    }

    /// Application-level registration, visible to every mounted scope.
    pub fn provide<T, N, D>(&self, context: &Context<T, N, D>, value: N::Write<T>)
    where
        T: ContextValue,
        N: Nullability,
        D: DefaultMode,
    {
        self.register(context.key(), N::into_stored(value));
    }

    pub fn register<T: ContextValue>(&self, key: &ContextKey<T>, value: Option<T>) {
        self.node.register(key, value);
    }

    /// Resolves against the host frame only.
    pub fn lookup<T: ContextValue>(&self, key: &ContextKey<T>, fallback: Fallback<'_, T>) -> Option<T> {
        resolve(Some(&self.node), key, fallback)
    }

    /// Creates a root component scope below the host frame.
    pub fn mount(&self, label: impl Into<Arc<str>>) -> Scope {
        Scope {
            node: ScopeNode::new(
                label.into(),
                Some(self.node.clone()),
                self.node.diagnostics.clone(),
            ),
        }
    }

    /// Runs `f` with the host as the ambient reader, so accessors resolve
    /// application-level registrations outside of any component.
    pub fn run_with_context<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = current::push(Active::Host(self.clone()));
        f()
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("id", &self.node.id)
            .field("label", &self.node.label)
            .field("registrations", &self.node.frame.read().len())
            .finish()
    }
}

/// Component scope. Clones are handles to the same node.
#[derive(Clone)]
pub struct Scope {
    node: Arc<ScopeNode>,
}

impl Scope {
    pub fn id(&self) -> u64 {
        self.node.id
    }

    pub fn label(&self) -> &str {
        &self.node.label
    }

    pub fn depth(&self) -> usize {
        self.node.depth
    }

    /// Enclosing component scope; `None` for a root scope.
    pub fn parent(&self) -> Option<Scope> {
        self.node
            .parent
            .as_ref()
            .filter(|parent| parent.parent.is_some())
            .map(|parent| Scope {
                node: parent.clone(),
            })
    }

    pub fn child(&self, label: impl Into<Arc<str>>) -> Scope {
        Scope {
            node: ScopeNode::new(
                label.into(),
                Some(self.node.clone()),
                self.node.diagnostics.clone(),
            ),
        }
    }

    /// Evaluates `f` with this scope as the ambient current scope.
    pub fn enter<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.activate();
        f()
    }

    pub fn activate(&self) -> ScopeGuard {
        current::push(Active::Component(self.clone()))
    }

    pub fn register<T: ContextValue>(&self, key: &ContextKey<T>, value: Option<T>) {
        self.node.register(key, value);
    }

    /// Nearest-ancestor resolution starting at the parent frame.
    pub fn lookup<T: ContextValue>(&self, key: &ContextKey<T>, fallback: Fallback<'_, T>) -> Option<T> {
        if self.node.diagnostics.warn_self_lookup && self.node.frame.read().contains(key.slot()) {
            warn!(
                key = %key,
                scope = %self.node.label,
                "Scope reads a key it registered itself; its own registration is only visible to descendants"
            );
        }
        resolve(self.node.parent.as_ref(), key, fallback)
    }

    pub fn registration_count(&self) -> usize {
        self.node.frame.read().len()
    }

    pub fn same_scope(&self, other: &Scope) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.node.id)
            .field("label", &self.node.label)
            .field("depth", &self.node.depth)
            .finish()
    }
}

pub(crate) fn register_current<T: ContextValue>(key: &ContextKey<T>, value: Option<T>) {
    match current::active() {
        Some(Active::Component(scope)) => scope.register(key, value),
        Some(Active::Host(host)) => warn!(
            key = %key,
            host = %host.label(),
            "Context write inside a host context has no component scope; ignored"
        ),
        None => warn!(key = %key, "Context write outside of any scope; ignored"),
    }
}

/// Outside of any scope nothing is resolved and the fallback is not applied.
pub(crate) fn lookup_current<T: ContextValue>(
    key: &ContextKey<T>,
    fallback: Fallback<'_, T>,
) -> Option<T> {
    match current::active() {
        Some(Active::Component(scope)) => scope.lookup(key, fallback),
        Some(Active::Host(host)) => host.lookup(key, fallback),
        None => {
            warn!(key = %key, "Context read outside of any scope; resolving as absent");
            None
        }
    }
}
