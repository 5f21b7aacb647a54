//! Span tree nodes.
//!
//! A [`Span`] handle is either *recording* — a real node registered in a
//! trace tree, firing lifecycle hooks — or a *non-recording* placeholder
//! that only answers identity queries. Both share one handle type so
//! instrumentation code never branches on whether tracing is active.

mod non_recording;
mod recording;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::id::{SpanId, TraceId};
use crate::propagation::TraceHeader;

pub(crate) use non_recording::NonRecordingSpan;
pub(crate) use recording::{NewRecordingSpan, RecordingSpan};

/// Status of a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanStatus {
    /// No status has been recorded.
    #[default]
    Unset,
    /// The operation completed successfully.
    Ok,
    /// The operation failed.
    InternalError,
}

impl SpanStatus {
    /// Returns `true` if the status is [`SpanStatus::Ok`].
    pub fn is_ok(&self) -> bool {
        matches!(self, SpanStatus::Ok)
    }

    /// Returns `true` if the status is [`SpanStatus::InternalError`].
    pub fn is_error(&self) -> bool {
        matches!(self, SpanStatus::InternalError)
    }

    /// Returns `true` if no status has been recorded.
    pub fn is_unset(&self) -> bool {
        matches!(self, SpanStatus::Unset)
    }

    /// Returns the wire representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanStatus::Unset => "unset",
            SpanStatus::Ok => "ok",
            SpanStatus::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for SpanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A primitive value attached to a span as an attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SpanValue {
    /// A string value.
    String(String),
    /// An integer value.
    Int(i64),
    /// A float value.
    Float(f64),
    /// A boolean value.
    Bool(bool),
}

impl SpanValue {
    /// Returns the value as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SpanValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as an integer, if it is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            SpanValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a float, if it is one.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            SpanValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SpanValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for SpanValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpanValue::String(s) => write!(f, "{}", s),
            SpanValue::Int(i) => write!(f, "{}", i),
            SpanValue::Float(fl) => write!(f, "{}", fl),
            SpanValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for SpanValue {
    fn from(s: &str) -> Self {
        SpanValue::String(s.to_string())
    }
}

impl From<String> for SpanValue {
    fn from(s: String) -> Self {
        SpanValue::String(s)
    }
}

impl From<i64> for SpanValue {
    fn from(i: i64) -> Self {
        SpanValue::Int(i)
    }
}

impl From<i32> for SpanValue {
    fn from(i: i32) -> Self {
        SpanValue::Int(i as i64)
    }
}

impl From<u32> for SpanValue {
    fn from(i: u32) -> Self {
        SpanValue::Int(i as i64)
    }
}

impl From<usize> for SpanValue {
    fn from(i: usize) -> Self {
        SpanValue::Int(i as i64)
    }
}

impl From<f64> for SpanValue {
    fn from(f: f64) -> Self {
        SpanValue::Float(f)
    }
}

impl From<bool> for SpanValue {
    fn from(b: bool) -> Self {
        SpanValue::Bool(b)
    }
}

/// One timed operation node in a trace tree.
///
/// Handles are cheap to clone and safe to share across threads; all
/// mutation goes through interior locks. Identity (ids, sampling decision,
/// segment membership) is fixed at creation. [`Span::end`] is idempotent:
/// only the first call records the end timestamp and fires hooks.
///
/// ## Example
///
/// ```rust
/// use traceline::{SpanOptions, Tracer};
///
/// let tracer = Tracer::builder().sample_rate(1.0).build();
///
/// tracer.start_span(SpanOptions::new("GET /users"), |span| {
///     span.set_attribute("http.status_code", 200);
///     assert!(span.is_recording());
/// });
/// ```
#[derive(Clone)]
pub struct Span {
    repr: Repr,
}

#[derive(Clone)]
enum Repr {
    Recording(Arc<RecordingSpan>),
    NonRecording(Arc<NonRecordingSpan>),
}

impl Span {
    pub(crate) fn recording(params: NewRecordingSpan) -> Self {
        Self {
            repr: Repr::Recording(Arc::new(RecordingSpan::new(params))),
        }
    }

    pub(crate) fn non_recording(trace_id: TraceId, span_id: SpanId) -> Self {
        Self {
            repr: Repr::NonRecording(Arc::new(NonRecordingSpan::new(trace_id, span_id))),
        }
    }

    /// Returns the trace ID shared by every span of the logical trace.
    pub fn trace_id(&self) -> &TraceId {
        match &self.repr {
            Repr::Recording(inner) => &inner.trace_id,
            Repr::NonRecording(inner) => inner.trace_id(),
        }
    }

    /// Returns this span's ID.
    pub fn span_id(&self) -> &SpanId {
        match &self.repr {
            Repr::Recording(inner) => &inner.span_id,
            Repr::NonRecording(inner) => inner.span_id(),
        }
    }

    /// Returns the span or propagation-context id that caused this span.
    pub fn parent_span_id(&self) -> Option<&SpanId> {
        match &self.repr {
            Repr::Recording(inner) => inner.parent_span_id.as_ref(),
            Repr::NonRecording(_) => None,
        }
    }

    /// Returns `true` for a real span, `false` for a placeholder.
    pub fn is_recording(&self) -> bool {
        matches!(self.repr, Repr::Recording(_))
    }

    /// Returns the sampling decision fixed at creation.
    ///
    /// Placeholders are never sampled.
    pub fn is_sampled(&self) -> bool {
        match &self.repr {
            Repr::Recording(inner) => inner.sampled,
            Repr::NonRecording(_) => false,
        }
    }

    /// Returns `true` if this span is a transaction/segment boundary.
    pub fn is_segment(&self) -> bool {
        match &self.repr {
            Repr::Recording(inner) => inner.is_segment,
            Repr::NonRecording(_) => false,
        }
    }

    /// Returns the id of the segment this span belongs to.
    ///
    /// Equals the span's own id for segment boundaries. `None` for
    /// placeholders, which belong to no segment.
    pub fn segment_id(&self) -> Option<&SpanId> {
        match &self.repr {
            Repr::Recording(inner) => Some(&inner.segment_id),
            Repr::NonRecording(_) => None,
        }
    }

    /// Returns the span name.
    pub fn name(&self) -> String {
        match &self.repr {
            Repr::Recording(inner) => inner.state.lock().name.clone(),
            Repr::NonRecording(_) => String::new(),
        }
    }

    /// Updates the span name. Ignored after the span has ended.
    pub fn set_name(&self, name: impl Into<String>) {
        if let Repr::Recording(inner) = &self.repr {
            let name = name.into();
            inner.mutate(|state| state.name = name);
        }
    }

    /// Returns the operation category, if set.
    pub fn op(&self) -> Option<String> {
        match &self.repr {
            Repr::Recording(inner) => inner.state.lock().op.clone(),
            Repr::NonRecording(_) => None,
        }
    }

    /// Updates the operation category. Ignored after the span has ended.
    pub fn set_op(&self, op: impl Into<String>) {
        if let Repr::Recording(inner) = &self.repr {
            let op = op.into();
            inner.mutate(|state| state.op = Some(op));
        }
    }

    /// Returns the instrumentation origin tag.
    pub fn origin(&self) -> Option<String> {
        match &self.repr {
            Repr::Recording(inner) => Some(inner.origin.clone()),
            Repr::NonRecording(_) => None,
        }
    }

    /// Returns the span status.
    pub fn status(&self) -> SpanStatus {
        match &self.repr {
            Repr::Recording(inner) => inner.state.lock().status,
            Repr::NonRecording(_) => SpanStatus::Unset,
        }
    }

    /// Sets the span status. Ignored after the span has ended.
    pub fn set_status(&self, status: SpanStatus) {
        if let Repr::Recording(inner) = &self.repr {
            inner.mutate(|state| state.status = status);
        }
    }

    /// Sets an attribute; the last write for a key wins.
    ///
    /// Ignored after the span has ended.
    pub fn set_attribute(&self, key: impl Into<String>, value: impl Into<SpanValue>) {
        if let Repr::Recording(inner) = &self.repr {
            let key = key.into();
            let value = value.into();
            inner.mutate(|state| {
                state.attributes.insert(key, value);
            });
        }
    }

    /// Returns the attribute stored under `key`, if any.
    pub fn attribute(&self, key: &str) -> Option<SpanValue> {
        match &self.repr {
            Repr::Recording(inner) => inner.state.lock().attributes.get(key).cloned(),
            Repr::NonRecording(_) => None,
        }
    }

    /// Returns a snapshot of all attributes.
    pub fn attributes(&self) -> BTreeMap<String, SpanValue> {
        match &self.repr {
            Repr::Recording(inner) => inner.state.lock().attributes.clone(),
            Repr::NonRecording(_) => BTreeMap::new(),
        }
    }

    /// Returns the creation timestamp. `None` for placeholders.
    pub fn start_timestamp(&self) -> Option<DateTime<Utc>> {
        match &self.repr {
            Repr::Recording(inner) => Some(inner.start_timestamp),
            Repr::NonRecording(_) => None,
        }
    }

    /// Returns the end timestamp, once the span has ended.
    pub fn end_timestamp(&self) -> Option<DateTime<Utc>> {
        match &self.repr {
            Repr::Recording(inner) => inner.state.lock().end_timestamp,
            Repr::NonRecording(_) => None,
        }
    }

    /// Returns `true` once the span has ended.
    pub fn is_ended(&self) -> bool {
        self.end_timestamp().is_some()
    }

    /// Ends the span now.
    ///
    /// Idempotent: only the first call records the end timestamp, fires
    /// `span_end` and — for segment boundaries — `finish_transaction`.
    /// A no-op on placeholders.
    pub fn end(&self) {
        self.end_at(Utc::now());
    }

    /// Ends the span with an explicit timestamp.
    pub fn end_with_timestamp(&self, timestamp: DateTime<Utc>) {
        self.end_at(timestamp);
    }

    fn end_at(&self, timestamp: DateTime<Utc>) {
        let Repr::Recording(inner) = &self.repr else {
            return;
        };
        if !inner.mark_ended(timestamp) {
            return;
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(
            trace_id = %inner.trace_id,
            span_id = %inner.span_id,
            "span ended"
        );
        inner.hooks.emit_span_end(self);
        if inner.is_segment {
            let descendants = self.segment_spans();
            inner.hooks.emit_finish_transaction(self, &descendants);
        }
    }

    /// Returns the direct children, in insertion order.
    pub fn children(&self) -> Vec<Span> {
        match &self.repr {
            Repr::Recording(inner) => inner.children.lock().clone(),
            Repr::NonRecording(_) => Vec::new(),
        }
    }

    /// Returns this span plus every descendant belonging to the same
    /// segment, in tree order.
    ///
    /// Descent stops at children with a different segment id, so a forced
    /// sub-transaction and its subtree are excluded from the enclosing
    /// segment's aggregate.
    pub fn segment_spans(&self) -> Vec<Span> {
        let mut out = Vec::new();
        match self.segment_id() {
            Some(segment_id) => {
                let segment_id = segment_id.clone();
                collect_segment(self, &segment_id, &mut out);
            }
            None => out.push(self.clone()),
        }
        out
    }

    /// Serializes this span's identity into a trace continuation header.
    ///
    /// Placeholders carry no sampling decision in the header.
    pub fn trace_header(&self) -> TraceHeader {
        match &self.repr {
            Repr::Recording(inner) => TraceHeader::new(
                inner.trace_id.clone(),
                inner.span_id.clone(),
                Some(inner.sampled),
            ),
            Repr::NonRecording(inner) => {
                TraceHeader::new(inner.trace_id().clone(), inner.span_id().clone(), None)
            }
        }
    }

    /// Takes a serializable snapshot of the span.
    pub fn to_data(&self) -> SpanData {
        match &self.repr {
            Repr::Recording(inner) => {
                let state = inner.state.lock();
                SpanData {
                    trace_id: inner.trace_id.clone(),
                    span_id: inner.span_id.clone(),
                    parent_span_id: inner.parent_span_id.clone(),
                    name: state.name.clone(),
                    op: state.op.clone(),
                    origin: Some(inner.origin.clone()),
                    status: state.status,
                    sampled: inner.sampled,
                    is_segment: inner.is_segment,
                    segment_id: Some(inner.segment_id.clone()),
                    start_timestamp: Some(inner.start_timestamp),
                    end_timestamp: state.end_timestamp,
                    attributes: state.attributes.clone(),
                }
            }
            Repr::NonRecording(inner) => SpanData {
                trace_id: inner.trace_id().clone(),
                span_id: inner.span_id().clone(),
                parent_span_id: None,
                name: String::new(),
                op: None,
                origin: None,
                status: SpanStatus::Unset,
                sampled: false,
                is_segment: false,
                segment_id: None,
                start_timestamp: None,
                end_timestamp: None,
                attributes: BTreeMap::new(),
            },
        }
    }

    pub(crate) fn add_child(&self, child: Span) {
        if let Repr::Recording(inner) = &self.repr {
            inner.children.lock().push(child);
        }
    }
}

fn collect_segment(span: &Span, segment_id: &SpanId, out: &mut Vec<Span>) {
    out.push(span.clone());
    for child in span.children() {
        if child.segment_id() == Some(segment_id) {
            collect_segment(&child, segment_id, out);
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Span")
            .field("trace_id", self.trace_id())
            .field("span_id", self.span_id())
            .field("recording", &self.is_recording())
            .finish()
    }
}

/// Serializable snapshot of a span, handed to transport collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanData {
    /// The trace ID.
    pub trace_id: TraceId,
    /// The span ID.
    pub span_id: SpanId,
    /// The parent span ID, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<SpanId>,
    /// The span name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// The operation category, if set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,
    /// The instrumentation origin tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// The span status; omitted from serialized output while unset.
    #[serde(skip_serializing_if = "SpanStatus::is_unset")]
    pub status: SpanStatus,
    /// The sampling decision.
    pub sampled: bool,
    /// Whether the span is a transaction/segment boundary.
    pub is_segment: bool,
    /// The id of the segment the span belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_id: Option<SpanId>,
    /// When the span started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_timestamp: Option<DateTime<Utc>>,
    /// When the span ended, once it has.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_timestamp: Option<DateTime<Utc>>,
    /// The span attributes.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, SpanValue>,
}
