//! Ordered, synchronous listener dispatch for span lifecycle events.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::span::Span;

/// Listener invoked with a span on `span_start` / `span_end`.
pub(crate) type SpanListener = Arc<dyn Fn(&Span) + Send + Sync>;

/// Listener invoked with a segment span and its aggregated descendants.
pub(crate) type TransactionListener = Arc<dyn Fn(&Span, &[Span]) + Send + Sync>;

/// Append-only listener registry owned by the tracer.
///
/// Listeners run synchronously in registration order, on the flow that
/// triggered the event. Emission snapshots the registered listeners first,
/// so a listener may register further listeners without deadlocking; the
/// additions take effect from the next event on.
#[derive(Default)]
pub(crate) struct HookBus {
    span_start: RwLock<Vec<SpanListener>>,
    span_end: RwLock<Vec<SpanListener>>,
    finish_transaction: RwLock<Vec<TransactionListener>>,
}

impl HookBus {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on_span_start(&self, listener: SpanListener) {
        self.span_start.write().push(listener);
    }

    pub(crate) fn on_span_end(&self, listener: SpanListener) {
        self.span_end.write().push(listener);
    }

    pub(crate) fn on_finish_transaction(&self, listener: TransactionListener) {
        self.finish_transaction.write().push(listener);
    }

    pub(crate) fn emit_span_start(&self, span: &Span) {
        for listener in self.snapshot(&self.span_start) {
            listener(span);
        }
    }

    pub(crate) fn emit_span_end(&self, span: &Span) {
        for listener in self.snapshot(&self.span_end) {
            listener(span);
        }
    }

    pub(crate) fn emit_finish_transaction(&self, span: &Span, descendants: &[Span]) {
        let listeners: Vec<_> = self.finish_transaction.read().iter().cloned().collect();
        for listener in listeners {
            listener(span, descendants);
        }
    }

    fn snapshot(&self, listeners: &RwLock<Vec<SpanListener>>) -> Vec<SpanListener> {
        listeners.read().iter().cloned().collect()
    }
}

impl std::fmt::Debug for HookBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookBus")
            .field("span_start", &self.span_start.read().len())
            .field("span_end", &self.span_end.read().len())
            .field("finish_transaction", &self.finish_transaction.read().len())
            .finish()
    }
}
