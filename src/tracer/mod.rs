//! Span lifecycle engine.
//!
//! The [`Tracer`] is the coordinator instrumentation code talks to: it
//! resolves parents from the ambient scope, applies sampling, registers
//! spans in the trace tree, keeps the scope stack honest across both
//! synchronous and asynchronous control flow, and dispatches lifecycle
//! hooks to downstream consumers.

mod builder;
mod options;

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;

use crate::future::ScopedFuture;
use crate::hooks::HookBus;
use crate::id::SpanId;
use crate::propagation::{DynamicSamplingContext, PropagationContext};
use crate::sampling::{SamplingContext, SamplingDecider};
use crate::scope::{self, Scope};
use crate::span::{NewRecordingSpan, Span, SpanStatus};

pub use builder::TracerBuilder;
pub use options::SpanOptions;

/// The span lifecycle engine.
///
/// A `Tracer` owns the sampling configuration and the hook bus; it holds
/// no spans itself. Handles are cheap to clone and share one engine.
///
/// ## Example
///
/// ```rust
/// use traceline::{SpanOptions, Tracer};
///
/// let tracer = Tracer::builder().sample_rate(1.0).build();
///
/// tracer.on_span_end(|span| {
///     println!("finished {} in trace {}", span.name(), span.trace_id());
/// });
///
/// let rows = tracer.start_span(SpanOptions::new("GET /users"), |_span| {
///     tracer.start_span(SpanOptions::new("SELECT * FROM users"), |span| {
///         span.set_op("db.query");
///         3
///     })
/// });
/// assert_eq!(rows, 3);
/// ```
#[derive(Clone)]
pub struct Tracer {
    pub(crate) inner: Arc<TracerInner>,
}

pub(crate) struct TracerInner {
    pub(crate) decider: SamplingDecider,
    pub(crate) environment: Option<String>,
    pub(crate) release: Option<String>,
    pub(crate) hooks: Arc<HookBus>,
}

/// A freshly created span together with the scope fork it is active in.
struct StartedSpan {
    span: Span,
    scope: Scope,
}

impl Tracer {
    /// Returns a builder for a new tracer.
    pub fn builder() -> TracerBuilder {
        TracerBuilder::new()
    }

    /// Creates a tracer with tracing inactive.
    ///
    /// Every span request yields a non-recording placeholder.
    pub fn disabled() -> Self {
        TracerBuilder::new().build()
    }

    /// Returns `true` when some sampling configuration is present.
    pub fn is_enabled(&self) -> bool {
        self.inner.decider.is_enabled()
    }

    /// Registers a listener for span creation.
    ///
    /// Fires synchronously, in creation order, for every recording span.
    /// Listeners are append-only and run in registration order.
    pub fn on_span_start(&self, listener: impl Fn(&Span) + Send + Sync + 'static) {
        self.inner.hooks.on_span_start(Arc::new(listener));
    }

    /// Registers a listener for span completion.
    ///
    /// Fires synchronously at the first `end()` of every recording span,
    /// in completion order.
    pub fn on_span_end(&self, listener: impl Fn(&Span) + Send + Sync + 'static) {
        self.inner.hooks.on_span_end(Arc::new(listener));
    }

    /// Registers a listener for finished transactions.
    ///
    /// Fires immediately after `span_end`, only for segment boundaries.
    /// The listener receives the segment span and its aggregated
    /// descendants (every span sharing its segment id, in tree order).
    pub fn on_finish_transaction(&self, listener: impl Fn(&Span, &[Span]) + Send + Sync + 'static) {
        self.inner.hooks.on_finish_transaction(Arc::new(listener));
    }

    /// Starts a span, runs `op` with it active, and ends it on return.
    ///
    /// The new span becomes the scope's active span for the extent of
    /// `op`; the previous scope is restored afterwards on every exit path.
    /// If `op` panics, the span status is set to `internal_error`, the
    /// span is ended, and the panic continues unwinding unmodified.
    /// `op`'s return value is passed through unchanged.
    pub fn start_span<T>(&self, options: SpanOptions, op: impl FnOnce(&Span) -> T) -> T {
        let StartedSpan { span, scope } = self.begin_span(options);
        let _scope_guard = scope::enter(scope);
        let guard = CompletionGuard::new(span);
        let result = op(&guard.span);
        guard.complete();
        result
    }

    /// Fallible variant of [`start_span`](Self::start_span).
    ///
    /// An `Err` return sets the span status to `internal_error` before the
    /// span ends; the error itself is returned untouched.
    pub fn try_start_span<T, E>(
        &self,
        options: SpanOptions,
        op: impl FnOnce(&Span) -> Result<T, E>,
    ) -> Result<T, E> {
        let StartedSpan { span, scope } = self.begin_span(options);
        let _scope_guard = scope::enter(scope);
        let guard = CompletionGuard::new(span);
        let result = op(&guard.span);
        if result.is_err() {
            guard.span.set_status(SpanStatus::InternalError);
        }
        guard.complete();
        result
    }

    /// Asynchronous variant of [`start_span`](Self::start_span).
    ///
    /// The span is created (and `span_start` fired) immediately; `op` runs
    /// inside the returned future with the forked scope installed on every
    /// poll, so the span stays active across `.await` suspension points.
    /// The span ends when the future completes; a future dropped before
    /// completion leaves its span un-ended and therefore unreported.
    pub fn start_span_async<F, Fut>(
        &self,
        options: SpanOptions,
        op: F,
    ) -> ScopedFuture<impl Future<Output = Fut::Output>>
    where
        F: FnOnce(Span) -> Fut,
        Fut: Future,
    {
        let StartedSpan { span, scope } = self.begin_span(options);
        let mut stack = scope::snapshot_stack();
        stack.push(scope);
        let fut = async move {
            let guard = CompletionGuard::new(span);
            let result = op(guard.span.clone()).await;
            guard.complete();
            result
        };
        ScopedFuture::with_stack(fut, stack)
    }

    /// Asynchronous variant of [`try_start_span`](Self::try_start_span).
    pub fn try_start_span_async<F, Fut, T, E>(
        &self,
        options: SpanOptions,
        op: F,
    ) -> ScopedFuture<impl Future<Output = Result<T, E>>>
    where
        F: FnOnce(Span) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let StartedSpan { span, scope } = self.begin_span(options);
        let mut stack = scope::snapshot_stack();
        stack.push(scope);
        let fut = async move {
            let guard = CompletionGuard::new(span);
            let result = op(guard.span.clone()).await;
            if result.is_err() {
                guard.span.set_status(SpanStatus::InternalError);
            }
            guard.complete();
            result
        };
        ScopedFuture::with_stack(fut, stack)
    }

    /// Starts a span that must be ended explicitly.
    ///
    /// Parent resolution, sampling and activation work exactly like
    /// [`start_span`](Self::start_span), but the span is not auto-ended:
    /// `op` receives the span and a [`SpanFinisher`] and calls
    /// `finish()` (or `Span::end`) itself. The previous scope is restored
    /// when the call's synchronous extent returns — the span may remain
    /// the active span after it has ended, until that point.
    pub fn start_span_manual<T>(
        &self,
        options: SpanOptions,
        op: impl FnOnce(&Span, SpanFinisher) -> T,
    ) -> T {
        let StartedSpan { span, scope } = self.begin_span(options);
        let _scope_guard = scope::enter(scope);
        let finisher = SpanFinisher { span: span.clone() };
        op(&span, finisher)
    }

    /// Creates and registers a span without making it active.
    ///
    /// The caller holds the returned handle and calls [`Span::end`]; the
    /// ambient scope and [`scope::active_span`] are unaffected.
    pub fn start_inactive_span(&self, options: SpanOptions) -> Span {
        let parent_scope = options.scope.clone().unwrap_or_else(scope::current);
        self.build_span(options, &parent_scope)
    }

    /// Returns the dynamic sampling context to propagate for `span`.
    ///
    /// The frozen context from the ambient propagation context wins when
    /// present; otherwise one is generated from configuration and the
    /// span's own identity. Generation is deterministic for a given span,
    /// so the result does not need to be cached to stay stable.
    pub fn dynamic_sampling_context_for(&self, span: &Span) -> DynamicSamplingContext {
        if let Some(dsc) = scope::current().propagation_context().dsc() {
            return dsc.clone();
        }
        let mut dsc = DynamicSamplingContext::new();
        dsc.insert("trace_id", span.trace_id().to_string());
        dsc.insert("sampled", if span.is_sampled() { "true" } else { "false" });
        if let Some(rate) = self.inner.decider.sample_rate() {
            dsc.insert("sample_rate", format!("{}", rate));
        }
        if let Some(environment) = &self.inner.environment {
            dsc.insert("environment", environment.clone());
        }
        if let Some(release) = &self.inner.release {
            dsc.insert("release", release.clone());
        }
        if span.is_segment() {
            let name = span.name();
            if !name.is_empty() {
                dsc.insert("transaction", name);
            }
        }
        dsc
    }

    fn begin_span(&self, options: SpanOptions) -> StartedSpan {
        let parent_scope = options.scope.clone().unwrap_or_else(scope::current);
        let span = self.build_span(options, &parent_scope);
        let mut scope = parent_scope.fork();
        scope.set_span(Some(span.clone()));
        StartedSpan { span, scope }
    }

    fn build_span(&self, options: SpanOptions, scope: &Scope) -> Span {
        let propagation = scope.propagation_context();
        if !self.is_enabled() {
            return Span::non_recording(propagation.trace_id().clone(), SpanId::random());
        }

        let parent = scope.span().cloned();
        if options.only_if_parent && parent.is_none() {
            return Span::non_recording(propagation.trace_id().clone(), SpanId::random());
        }

        // Parent identity: active span first, ambient propagation context
        // as the fallback seed for a fresh root.
        let (trace_id, parent_span_id, parent_sampled, parent_segment_id) = match &parent {
            Some(parent) => (
                parent.trace_id().clone(),
                Some(parent.span_id().clone()),
                Some(parent.is_sampled()),
                parent.segment_id().cloned(),
            ),
            None => (
                propagation.trace_id().clone(),
                propagation.parent_span_id().cloned(),
                propagation.sampled(),
                None,
            ),
        };

        let trace_id = options.trace_id.unwrap_or(trace_id);
        let parent_span_id = options.parent_span_id.or(parent_span_id);
        let parent_sampled = options.parent_sampled.or(parent_sampled);

        // Legacy `data` merges under `attributes`
        let mut attributes = options.data.unwrap_or_default();
        attributes.extend(options.attributes.unwrap_or_default());

        // An inherited decision is reused verbatim; the sampler only ever
        // runs for roots without one.
        let sampled = match parent_sampled {
            Some(decision) => decision,
            None => self.inner.decider.decide_root(&SamplingContext {
                name: options.name.clone(),
                op: options.op.clone(),
                attributes: attributes.clone(),
                parent_sampled: None,
            }),
        };

        let span_id = SpanId::random();
        let (is_segment, segment_id) = match (&parent_segment_id, options.force_transaction) {
            (Some(segment_id), false) => (false, segment_id.clone()),
            _ => (true, span_id.clone()),
        };

        let span = Span::recording(NewRecordingSpan {
            trace_id,
            span_id,
            parent_span_id,
            sampled,
            is_segment,
            segment_id,
            name: options.name,
            op: options.op,
            origin: options.origin.unwrap_or_else(|| "manual".to_string()),
            attributes,
            start_timestamp: options.start_timestamp.unwrap_or_else(Utc::now),
            hooks: Arc::clone(&self.inner.hooks),
        });

        if let Some(parent) = &parent {
            parent.add_child(span.clone());
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            trace_id = %span.trace_id(),
            span_id = %span.span_id(),
            name = %span.name(),
            sampled = span.is_sampled(),
            "span started"
        );
        self.inner.hooks.emit_span_start(&span);
        span
    }
}

impl std::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracer")
            .field("decider", &self.inner.decider)
            .field("environment", &self.inner.environment)
            .field("release", &self.inner.release)
            .finish()
    }
}

/// Explicit completion handle passed to
/// [`start_span_manual`](Tracer::start_span_manual) operations.
#[derive(Debug)]
pub struct SpanFinisher {
    span: Span,
}

impl SpanFinisher {
    /// Ends the span. Equivalent to calling [`Span::end`].
    pub fn finish(self) {
        self.span.end();
    }

    /// Returns the span this finisher ends.
    pub fn span(&self) -> &Span {
        &self.span
    }
}

/// Ends the wrapped span exactly once: normally via `complete()`, or with
/// an `internal_error` status when dropped during a panic unwind. Dropped
/// without either (a cancelled future), the span stays un-ended and is
/// never reported.
struct CompletionGuard {
    span: Span,
    completed: bool,
}

impl CompletionGuard {
    fn new(span: Span) -> Self {
        Self {
            span,
            completed: false,
        }
    }

    fn complete(mut self) {
        self.completed = true;
        self.span.end();
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if !self.completed && std::thread::panicking() {
            self.span.set_status(SpanStatus::InternalError);
            self.span.end();
        }
    }
}

/// Builds a propagation context from incoming headers without installing
/// it anywhere.
///
/// Missing or malformed input yields a fresh root context; this never
/// fails.
pub fn continue_trace_context(trace: Option<&str>, baggage: Option<&str>) -> PropagationContext {
    PropagationContext::continue_from(trace, baggage)
}

/// Continues a trace from incoming headers for the duration of `op`.
///
/// The ambient scope is forked, the parsed context installed on the fork,
/// and `op` invoked with the context; the previous scope is restored on
/// every exit path. Spans started inside `op` without another parent
/// become roots of the continued trace.
///
/// ## Example
///
/// ```rust
/// use traceline::{SpanOptions, Tracer, continue_trace};
///
/// let tracer = Tracer::builder().sample_rate(1.0).build();
///
/// continue_trace(
///     Some("12312012123120121231201212312012-1121201211212012-1"),
///     Some("sentry-environment=production"),
///     |context| {
///         assert_eq!(context.sampled(), Some(true));
///         tracer.start_span(SpanOptions::new("handle request"), |span| {
///             assert_eq!(span.trace_id().to_string(), "12312012123120121231201212312012");
///         });
///     },
/// );
/// ```
pub fn continue_trace<T>(
    trace: Option<&str>,
    baggage: Option<&str>,
    op: impl FnOnce(&PropagationContext) -> T,
) -> T {
    let context = PropagationContext::continue_from(trace, baggage);
    let mut forked = scope::current().fork();
    forked.set_propagation_context(context.clone());
    let _guard = scope::enter(forked);
    op(&context)
}
