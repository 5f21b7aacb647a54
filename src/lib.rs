//! # traceline
//!
//! Embeddable span/scope propagation engine for distributed-tracing SDKs.
//!
//! The crate decides how operations become a tree of timed spans, how
//! sampling is applied and inherited, how trace identity crosses service
//! boundaries via textual headers, and how completed spans are surfaced to
//! downstream consumers. It speaks the compact `sentry-trace` continuation
//! header and the `sentry-`-prefixed `baggage` entries, so traces continue
//! seamlessly from and to Sentry-compatible services.
//!
//! Transport, envelope serialization and concrete library instrumentation
//! are deliberately out of scope: consumers subscribe to lifecycle hooks
//! and receive finished spans as plain data.
//!
//! ## Quick Start
//!
//! ```rust
//! use traceline::{SpanOptions, Tracer, continue_trace};
//!
//! let tracer = Tracer::builder().sample_rate(1.0).build();
//!
//! // downstream consumers subscribe to lifecycle hooks
//! tracer.on_finish_transaction(|span, descendants| {
//!     println!("transaction {} with {} spans", span.name(), descendants.len());
//! });
//!
//! // continue a trace from incoming request headers
//! continue_trace(
//!     Some("12312012123120121231201212312012-1121201211212012-1"),
//!     Some("sentry-environment=production"),
//!     |_context| {
//!         tracer.start_span(SpanOptions::new("GET /users"), |span| {
//!             span.set_op("http.server");
//!             tracer.start_span(SpanOptions::new("SELECT * FROM users"), |span| {
//!                 span.set_op("db.query");
//!             });
//!         });
//!     },
//! );
//! ```
//!
//! ## Key Concepts
//!
//! - **Scope**: ambient, forkable holder of the active span and
//!   propagation context; forked for the extent of every span and restored
//!   on every exit path, including panics.
//! - **Propagation Context**: minimal trace identity carried even while
//!   tracing is inactive.
//! - **Sampling**: decided once per trace root (fixed rate or custom
//!   predicate) and inherited verbatim by every descendant.
//! - **Segments**: root spans — and spans started with
//!   `force_transaction` — become transaction boundaries, aggregated and
//!   reported with their descendants on `finish_transaction`.
//! - **Non-recording spans**: identity-only placeholders returned when
//!   tracing is inactive, so instrumentation never branches.
//!
//! ## Features
//!
//! - `tracing`: emit engine diagnostics through the `tracing` ecosystem

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

// Core modules
pub mod id;
pub mod propagation;
pub mod sampling;
pub mod scope;
pub mod span;
pub mod tracer;

// Async context propagation
pub mod future;

// Listener registry (internal; subscribe through `Tracer::on_*`)
mod hooks;

// Prelude for convenient imports
pub mod prelude;

// Re-export main types at crate root for convenience
pub use future::{ScopedFuture, ScopedFutureExt};
pub use id::{IdParseError, SpanId, TraceId};
pub use propagation::{
    BAGGAGE_HEADER_NAME, BAGGAGE_KEY_PREFIX, DynamicSamplingContext, HeaderParseError,
    PropagationContext, TRACE_HEADER_NAME, TraceHeader,
};
pub use sampling::{Sampler, SamplingContext};
pub use scope::{Scope, ScopeGuard};
pub use span::{Span, SpanData, SpanStatus, SpanValue};
pub use tracer::{
    SpanFinisher, SpanOptions, Tracer, TracerBuilder, continue_trace, continue_trace_context,
};
