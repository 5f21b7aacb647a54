//! Ambient, forkable holder of the active span and propagation context.
//!
//! Every logical flow of control sees exactly one *current* scope, kept on
//! a thread-local stack. Starting a span forks the current scope, installs
//! the fork for the extent of the operation, and restores the previous
//! scope on every exit path — normal return, early `?`, or panic — via a
//! drop guard. Asynchronous flows carry their stack across suspension
//! points with [`ScopedFuture`](crate::ScopedFuture), so two tasks
//! interleaving on one thread never observe each other's active span.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::marker::PhantomData;

use crate::propagation::PropagationContext;
use crate::span::Span;

thread_local! {
    static SCOPE_STACK: RefCell<Vec<Scope>> = const { RefCell::new(Vec::new()) };
}

/// Ambient container for the active span, propagation context and tags.
///
/// Forking produces an independent structural copy: mutations of the fork
/// never show through to the scope it was forked from.
///
/// ## Example
///
/// ```rust
/// use traceline::scope;
///
/// scope::configure(|s| s.set_tag("request_id", "abc123"));
///
/// let outcome = scope::fork(|| {
///     scope::configure(|s| s.set_tag("request_id", "xyz789"));
///     scope::current().tag("request_id").unwrap()
/// });
/// assert_eq!(outcome, "xyz789");
///
/// // the fork's mutations died with it
/// assert_eq!(scope::current().tag("request_id").as_deref(), Some("abc123"));
/// ```
#[derive(Debug, Clone)]
pub struct Scope {
    span: Option<Span>,
    propagation_context: PropagationContext,
    tags: BTreeMap<String, String>,
}

impl Scope {
    /// Creates a scope with a fresh propagation context and no active span.
    pub fn new() -> Self {
        Self {
            span: None,
            propagation_context: PropagationContext::new_root(),
            tags: BTreeMap::new(),
        }
    }

    /// Produces an independent copy of this scope.
    #[must_use]
    pub fn fork(&self) -> Self {
        self.clone()
    }

    /// Returns the active span, if any.
    pub fn span(&self) -> Option<&Span> {
        self.span.as_ref()
    }

    /// Sets or clears the active span.
    pub fn set_span(&mut self, span: Option<Span>) {
        self.span = span;
    }

    /// Returns the propagation context.
    pub fn propagation_context(&self) -> &PropagationContext {
        &self.propagation_context
    }

    /// Replaces the propagation context.
    pub fn set_propagation_context(&mut self, context: PropagationContext) {
        self.propagation_context = context;
    }

    /// Sets a contextual tag.
    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }

    /// Returns the tag stored under `key`, if any.
    pub fn tag(&self, key: &str) -> Option<String> {
        self.tags.get(key).cloned()
    }

    /// Returns all tags.
    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

/// Restores the previous scope when dropped.
///
/// Returned by [`enter`]; hold it for the extent the scope should stay
/// current. Not `Send`: the scope stack is per-thread.
#[must_use = "dropping the guard immediately restores the previous scope"]
pub struct ScopeGuard {
    _not_send: PhantomData<*const ()>,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        SCOPE_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

impl std::fmt::Debug for ScopeGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeGuard").finish()
    }
}

/// Returns a snapshot of the current scope.
///
/// Mutating the returned value does not affect the ambient scope; use
/// [`configure`] for that.
pub fn current() -> Scope {
    SCOPE_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        if let Some(scope) = stack.last() {
            scope.clone()
        } else {
            let scope = Scope::new();
            stack.push(scope.clone());
            scope
        }
    })
}

/// Returns the active span of the current scope, if any.
pub fn active_span() -> Option<Span> {
    SCOPE_STACK.with(|stack| {
        stack
            .borrow()
            .last()
            .and_then(|scope| scope.span().cloned())
    })
}

/// Mutates the current scope in place.
///
/// The closure must not start spans or enter scopes; it only edits the
/// scope it is handed.
pub fn configure<T>(f: impl FnOnce(&mut Scope) -> T) -> T {
    SCOPE_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        if let Some(scope) = stack.last_mut() {
            f(scope)
        } else {
            let mut scope = Scope::new();
            let result = f(&mut scope);
            stack.push(scope);
            result
        }
    })
}

/// Installs `scope` as the current scope until the guard is dropped.
pub fn enter(scope: Scope) -> ScopeGuard {
    SCOPE_STACK.with(|stack| stack.borrow_mut().push(scope));
    ScopeGuard {
        _not_send: PhantomData,
    }
}

/// Forks the current scope and runs `f` with the fork installed.
///
/// The previous scope is restored when `f` returns or unwinds.
pub fn fork<T>(f: impl FnOnce() -> T) -> T {
    let _guard = enter(current().fork());
    f()
}

/// Clones the whole scope stack for binding to a future.
pub(crate) fn snapshot_stack() -> Vec<Scope> {
    SCOPE_STACK.with(|stack| stack.borrow().clone())
}

/// Swaps the thread's scope stack with `other`.
pub(crate) fn swap_stack(other: &mut Vec<Scope>) {
    SCOPE_STACK.with(|stack| std::mem::swap(&mut *stack.borrow_mut(), other));
}
