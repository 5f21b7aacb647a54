//! Scope propagation across asynchronous suspension points.
//!
//! A thread-local scope stack cannot survive an executor moving a task
//! between threads, and two tasks interleaving on one thread must not see
//! each other's active span. [`ScopedFuture`] solves both: it owns a scope
//! stack of its own and installs it around every poll of the inner future,
//! restoring the thread's previous stack afterwards — also when the poll
//! unwinds.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::scope::{self, Scope};

/// A future that runs with its own scope stack installed on every poll.
///
/// Mutations made to the ambient scope while the future is being polled
/// land in the future's stack and are visible again on the next poll.
///
/// ## Example
///
/// ```rust
/// use traceline::{ScopedFutureExt, scope};
///
/// # futures::executor::block_on(async {
/// scope::configure(|s| s.set_tag("flow", "a"));
///
/// let task = async {
///     scope::current().tag("flow")
/// }
/// .bind_current_scope();
///
/// assert_eq!(task.await.as_deref(), Some("a"));
/// # });
/// ```
#[pin_project::pin_project]
#[must_use = "futures do nothing unless polled"]
pub struct ScopedFuture<F> {
    #[pin]
    inner: F,
    stack: Vec<Scope>,
}

impl<F> ScopedFuture<F> {
    pub(crate) fn with_stack(inner: F, stack: Vec<Scope>) -> Self {
        Self { inner, stack }
    }
}

impl<F: Future> Future for ScopedFuture<F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let _restore = StackSwap::install(this.stack);
        this.inner.poll(cx)
    }
}

/// Swaps the bound stack in on construction and back out on drop, so the
/// thread's own stack is restored even if the inner poll panics.
struct StackSwap<'a> {
    saved: &'a mut Vec<Scope>,
}

impl<'a> StackSwap<'a> {
    fn install(saved: &'a mut Vec<Scope>) -> Self {
        scope::swap_stack(saved);
        Self { saved }
    }
}

impl Drop for StackSwap<'_> {
    fn drop(&mut self) {
        scope::swap_stack(self.saved);
    }
}

/// Binds futures to a scope stack.
pub trait ScopedFutureExt: Sized {
    /// Runs this future with the current scope stack plus `scope` on top.
    fn bind_scope(self, scope: Scope) -> ScopedFuture<Self>;

    /// Runs this future with a snapshot of the current scope stack.
    ///
    /// Use this when handing work to a spawned task that should keep
    /// seeing the caller's active span.
    fn bind_current_scope(self) -> ScopedFuture<Self>;
}

impl<F: Future> ScopedFutureExt for F {
    fn bind_scope(self, scope: Scope) -> ScopedFuture<Self> {
        let mut stack = scope::snapshot_stack();
        stack.push(scope);
        ScopedFuture::with_stack(self, stack)
    }

    fn bind_current_scope(self) -> ScopedFuture<Self> {
        ScopedFuture::with_stack(self, scope::snapshot_stack())
    }
}
