//! Minimal trace identity carried even when no span is active.

use crate::id::{SpanId, TraceId};
use crate::propagation::baggage::DynamicSamplingContext;
use crate::propagation::header::TraceHeader;

/// The minimal trace identity a scope carries at all times.
///
/// A propagation context exists even while tracing is inactive, so that
/// outgoing requests keep a coherent trace identity and an incoming
/// continuation header can seed later root spans.
///
/// The dynamic sampling context is `None` while still mutable (nothing
/// upstream has been observed) and `Some` — possibly empty — once frozen.
///
/// ## Example
///
/// ```rust
/// use traceline::PropagationContext;
///
/// let ctx = PropagationContext::continue_from(
///     Some("12312012123120121231201212312012-1121201211212012-1"),
///     Some("sentry-environment=production"),
/// );
///
/// assert_eq!(ctx.trace_id().to_string(), "12312012123120121231201212312012");
/// assert_eq!(ctx.parent_span_id().map(ToString::to_string).as_deref(), Some("1121201211212012"));
/// assert_eq!(ctx.sampled(), Some(true));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropagationContext {
    trace_id: TraceId,
    span_id: SpanId,
    parent_span_id: Option<SpanId>,
    sampled: Option<bool>,
    dsc: Option<DynamicSamplingContext>,
}

impl PropagationContext {
    /// Creates a fresh root context with random identifiers.
    ///
    /// No sampling decision is made and the dynamic sampling context stays
    /// mutable.
    pub fn new_root() -> Self {
        Self {
            trace_id: TraceId::random(),
            span_id: SpanId::random(),
            parent_span_id: None,
            sampled: None,
            dsc: None,
        }
    }

    /// Builds a context from incoming continuation and baggage headers.
    ///
    /// A missing or malformed trace header means "no incoming context": the
    /// result is a fresh root and the baggage is ignored. A valid header
    /// contributes the trace id, the caller's span id as parent, and the
    /// sampled flag; a **new** local span id is always generated, and the
    /// dynamic sampling context is frozen to the parsed baggage (possibly
    /// empty). This never fails.
    pub fn continue_from(trace: Option<&str>, baggage: Option<&str>) -> Self {
        let header = match trace.map(TraceHeader::parse) {
            Some(Ok(header)) => header,
            Some(Err(_error)) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %_error, "discarding malformed trace header");
                return Self::new_root();
            }
            None => return Self::new_root(),
        };

        let dsc = baggage
            .map(DynamicSamplingContext::from_baggage)
            .unwrap_or_default();

        Self {
            trace_id: header.trace_id().clone(),
            span_id: SpanId::random(),
            parent_span_id: Some(header.span_id().clone()),
            sampled: header.sampled(),
            dsc: Some(dsc),
        }
    }

    /// Returns the trace ID.
    pub fn trace_id(&self) -> &TraceId {
        &self.trace_id
    }

    /// Returns the local span ID of this context.
    ///
    /// This id stands in for "the current span" when no span is actually
    /// active, e.g. when serializing outgoing headers outside any span.
    pub fn span_id(&self) -> &SpanId {
        &self.span_id
    }

    /// Returns the upstream parent span ID, if the trace was continued.
    pub fn parent_span_id(&self) -> Option<&SpanId> {
        self.parent_span_id.as_ref()
    }

    /// Returns the inherited sampling decision, if one was observed.
    pub fn sampled(&self) -> Option<bool> {
        self.sampled
    }

    /// Sets the sampling decision.
    #[must_use]
    pub fn with_sampled(mut self, sampled: Option<bool>) -> Self {
        self.sampled = sampled;
        self
    }

    /// Returns the dynamic sampling context, if frozen.
    pub fn dsc(&self) -> Option<&DynamicSamplingContext> {
        self.dsc.as_ref()
    }

    /// Freezes the dynamic sampling context to the given value.
    pub fn freeze_dsc(&mut self, dsc: DynamicSamplingContext) {
        self.dsc = Some(dsc);
    }

    /// Serializes this context into a trace continuation header.
    ///
    /// The context's own local span id is used as the header's span id, so
    /// a downstream service continuing from it will treat this context as
    /// its parent.
    pub fn trace_header(&self) -> TraceHeader {
        TraceHeader::new(self.trace_id.clone(), self.span_id.clone(), self.sampled)
    }
}

impl Default for PropagationContext {
    fn default() -> Self {
        Self::new_root()
    }
}
