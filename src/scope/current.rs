//! Ambient active scope
//!
//! The scope a component is being evaluated in is implicit, the way a host
//! framework tracks its current instance during setup. Entering a scope pushes
//! it onto a thread-local stack; the returned guard removes its own entry again,
//! including during unwinding and when guards are dropped out of order.

use super::{Host, Scope};
use std::cell::{Cell, RefCell};
use std::marker::PhantomData;

#[derive(Clone)]
pub(crate) enum Active {
    /// Component evaluation: writes go to the scope, reads start at its parent.
    Component(Scope),
    /// Host context: reads resolve against the host frame, writes are refused.
    Host(Host),
}

thread_local! {
    static ACTIVE: RefCell<Vec<(u64, Active)>> = const { RefCell::new(Vec::new()) };
    static NEXT_TOKEN: Cell<u64> = const { Cell::new(0) };
}

/// Keeps a scope active until dropped. Not `Send`: it belongs to the thread
/// whose stack it modified.
#[must_use = "the scope is deactivated as soon as the guard is dropped"]
pub struct ScopeGuard {
    token: u64,
    _thread_bound: PhantomData<*const ()>,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        ACTIVE.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(position) = stack.iter().rposition(|(token, _)| *token == self.token) {
                stack.remove(position);
            }
        });
    }
}

pub(crate) fn push(active: Active) -> ScopeGuard {
    let token = NEXT_TOKEN.with(|next| {
        let token = next.get();
        next.set(token.wrapping_add(1));
        token
    });
    ACTIVE.with(|stack| {
        stack.borrow_mut().push((token, active));
        ScopeGuard {
            token,
            _thread_bound: PhantomData,
        }
    })
}

/// Snapshot of the innermost active entry. Cloned out so that no borrow of the
/// stack is held while lookups run user factories.
pub(crate) fn active() -> Option<Active> {
    ACTIVE.with(|stack| stack.borrow().last().map(|(_, active)| active.clone()))
}

/// Whether `read`/`write` without an explicit scope have a position to use.
pub fn has_active_scope() -> bool {
    ACTIVE.with(|stack| !stack.borrow().is_empty())
}

/// The innermost active component scope, if any.
pub fn current_scope() -> Option<Scope> {
    match active()? {
        Active::Component(scope) => Some(scope),
        Active::Host(_) => None,
    }
}
