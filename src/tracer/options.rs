//! Options accepted when starting a span.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::id::{SpanId, TraceId};
use crate::scope::Scope;
use crate::span::SpanValue;

/// Options for starting a span.
///
/// Only the name is required. Everything else tunes parent resolution,
/// identity, sampling or promotion to a transaction boundary.
///
/// ## Example
///
/// ```rust
/// use traceline::SpanOptions;
///
/// let options = SpanOptions::builder()
///     .name("GET /users/{id}")
///     .op("http.server")
///     .origin("auto.http")
///     .force_transaction(true)
///     .build();
/// # let _ = options;
/// ```
#[derive(Debug, Clone, bon::Builder)]
pub struct SpanOptions {
    /// Human-readable span name.
    #[builder(into)]
    pub(crate) name: String,

    /// Operation category, e.g. `http.server` or `db.query`.
    #[builder(into)]
    pub(crate) op: Option<String>,

    /// Instrumentation source tag; defaults to `manual`.
    #[builder(into)]
    pub(crate) origin: Option<String>,

    /// Initial attributes.
    pub(crate) attributes: Option<BTreeMap<String, SpanValue>>,

    /// Legacy alias for `attributes`; merged in with `attributes` taking
    /// precedence on key collisions.
    pub(crate) data: Option<BTreeMap<String, SpanValue>>,

    /// Promote this span to a segment boundary even under a parent.
    #[builder(default)]
    pub(crate) force_transaction: bool,

    /// Return a non-recording placeholder when no parent is resolvable.
    #[builder(default)]
    pub(crate) only_if_parent: bool,

    /// Resolve the parent from this scope instead of the ambient one.
    pub(crate) scope: Option<Scope>,

    /// Explicit trace id, overriding whatever the parent provides.
    pub(crate) trace_id: Option<TraceId>,

    /// Explicit parent span id, overriding whatever the parent provides.
    pub(crate) parent_span_id: Option<SpanId>,

    /// Explicit inherited sampling decision.
    pub(crate) parent_sampled: Option<bool>,

    /// Explicit start time instead of "now".
    pub(crate) start_timestamp: Option<DateTime<Utc>>,
}

impl SpanOptions {
    /// Shorthand for options carrying just a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self::builder().name(name).build()
    }
}
