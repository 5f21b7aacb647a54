//! Convenient imports for common usage.
//!
//! ```rust
//! use traceline::prelude::*;
//!
//! let tracer = Tracer::builder().sample_rate(1.0).build();
//! tracer.start_span(SpanOptions::new("GET /users"), |span| {
//!     span.set_attribute("http.status_code", 200);
//! });
//! ```

pub use crate::future::{ScopedFuture, ScopedFutureExt};
pub use crate::id::{SpanId, TraceId};
pub use crate::propagation::{DynamicSamplingContext, PropagationContext, TraceHeader};
pub use crate::sampling::SamplingContext;
pub use crate::scope::{self, Scope};
pub use crate::span::{Span, SpanData, SpanStatus, SpanValue};
pub use crate::tracer::{
    SpanFinisher, SpanOptions, Tracer, TracerBuilder, continue_trace, continue_trace_context,
};
