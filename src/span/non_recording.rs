//! Placeholder span returned when tracing is inactive.

use crate::id::{SpanId, TraceId};

/// Identity-only stand-in for a real span.
///
/// Returned when tracing is disabled or a span was requested with
/// `only_if_parent` and no parent was resolvable. It satisfies identity
/// queries, is never registered in a span tree, never fires hooks, and
/// ending it is a no-op.
#[derive(Debug)]
pub(crate) struct NonRecordingSpan {
    trace_id: TraceId,
    span_id: SpanId,
}

impl NonRecordingSpan {
    pub(super) fn new(trace_id: TraceId, span_id: SpanId) -> Self {
        Self { trace_id, span_id }
    }

    pub(super) fn trace_id(&self) -> &TraceId {
        &self.trace_id
    }

    pub(super) fn span_id(&self) -> &SpanId {
        &self.span_id
    }
}
