//! Backing storage for a recording span.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::hooks::HookBus;
use crate::id::{SpanId, TraceId};
use crate::span::{Span, SpanStatus, SpanValue};

/// Immutable identity plus lock-protected mutable state of a real span.
///
/// Identity and the sampling decision are fixed at construction. The
/// children list has its own lock so two independent flows can append
/// children under the same parent concurrently.
pub(crate) struct RecordingSpan {
    pub(super) trace_id: TraceId,
    pub(super) span_id: SpanId,
    pub(super) parent_span_id: Option<SpanId>,
    pub(super) sampled: bool,
    pub(super) is_segment: bool,
    pub(super) segment_id: SpanId,
    pub(super) origin: String,
    pub(super) start_timestamp: DateTime<Utc>,
    pub(super) hooks: Arc<HookBus>,
    pub(super) state: Mutex<SpanState>,
    pub(super) children: Mutex<Vec<Span>>,
}

/// Mutable span fields; everything here freezes once the span ends.
pub(super) struct SpanState {
    pub(super) name: String,
    pub(super) op: Option<String>,
    pub(super) status: SpanStatus,
    pub(super) attributes: BTreeMap<String, SpanValue>,
    pub(super) end_timestamp: Option<DateTime<Utc>>,
}

/// Construction parameters for a recording span.
pub(crate) struct NewRecordingSpan {
    pub(crate) trace_id: TraceId,
    pub(crate) span_id: SpanId,
    pub(crate) parent_span_id: Option<SpanId>,
    pub(crate) sampled: bool,
    pub(crate) is_segment: bool,
    pub(crate) segment_id: SpanId,
    pub(crate) name: String,
    pub(crate) op: Option<String>,
    pub(crate) origin: String,
    pub(crate) attributes: BTreeMap<String, SpanValue>,
    pub(crate) start_timestamp: DateTime<Utc>,
    pub(crate) hooks: Arc<HookBus>,
}

impl RecordingSpan {
    pub(super) fn new(params: NewRecordingSpan) -> Self {
        Self {
            trace_id: params.trace_id,
            span_id: params.span_id,
            parent_span_id: params.parent_span_id,
            sampled: params.sampled,
            is_segment: params.is_segment,
            segment_id: params.segment_id,
            origin: params.origin,
            start_timestamp: params.start_timestamp,
            hooks: params.hooks,
            state: Mutex::new(SpanState {
                name: params.name,
                op: params.op,
                status: SpanStatus::Unset,
                attributes: params.attributes,
                end_timestamp: None,
            }),
            children: Mutex::new(Vec::new()),
        }
    }

    /// Records the end timestamp. Returns `false` if the span had already
    /// ended, in which case nothing changes.
    pub(super) fn mark_ended(&self, timestamp: DateTime<Utc>) -> bool {
        let mut state = self.state.lock();
        if state.end_timestamp.is_some() {
            return false;
        }
        state.end_timestamp = Some(timestamp);
        true
    }

    /// Runs `f` against the mutable state unless the span has ended.
    pub(super) fn mutate(&self, f: impl FnOnce(&mut SpanState)) {
        let mut state = self.state.lock();
        if state.end_timestamp.is_some() {
            return;
        }
        f(&mut state);
    }
}
