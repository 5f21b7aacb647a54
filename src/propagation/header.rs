//! Codec for the compact trace continuation header.
//!
//! The header grammar is `traceId-spanId[-sampledFlag]` where `traceId` is
//! 32 lowercase hex characters, `spanId` is 16 lowercase hex characters and
//! the optional `sampledFlag` is `0` or `1`. This is the `sentry-trace`
//! header format understood by Sentry-compatible backends.

use std::fmt;

use crate::id::{IdParseError, SpanId, TraceId};

/// Name of the trace continuation header.
pub const TRACE_HEADER_NAME: &str = "sentry-trace";

/// Error parsing a trace continuation header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum HeaderParseError {
    /// The header did not have the `traceId-spanId[-sampledFlag]` shape.
    #[error("trace header must be `traceId-spanId[-sampledFlag]`")]
    InvalidFormat,
    /// One of the identifiers failed to parse.
    #[error(transparent)]
    InvalidId(#[from] IdParseError),
    /// The sampled flag was present but neither `0` nor `1`.
    #[error("sampled flag must be `0` or `1`")]
    InvalidSampledFlag,
}

/// Parsed form of the trace continuation header.
///
/// ## Example
///
/// ```rust
/// use traceline::TraceHeader;
///
/// let header = TraceHeader::parse(
///     "12312012123120121231201212312012-1121201211212012-1"
/// ).unwrap();
///
/// assert_eq!(header.trace_id().to_string(), "12312012123120121231201212312012");
/// assert_eq!(header.span_id().to_string(), "1121201211212012");
/// assert_eq!(header.sampled(), Some(true));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceHeader {
    trace_id: TraceId,
    span_id: SpanId,
    sampled: Option<bool>,
}

impl TraceHeader {
    /// Creates a header value from its parts.
    pub fn new(trace_id: TraceId, span_id: SpanId, sampled: Option<bool>) -> Self {
        Self {
            trace_id,
            span_id,
            sampled,
        }
    }

    /// Parses a trace continuation header.
    ///
    /// Leading and trailing ASCII whitespace is ignored. Anything that does
    /// not match the grammar is an error; callers continuing a trace treat
    /// that as "no incoming context" rather than surfacing it.
    pub fn parse(value: &str) -> Result<Self, HeaderParseError> {
        let value = value.trim();
        let mut parts = value.split('-');

        let trace_id = match parts.next() {
            Some(part) if !part.is_empty() => TraceId::from_hex(part)?,
            _ => return Err(HeaderParseError::InvalidFormat),
        };
        let span_id = match parts.next() {
            Some(part) => SpanId::from_hex(part)?,
            None => return Err(HeaderParseError::InvalidFormat),
        };
        let sampled = match parts.next() {
            None => None,
            Some("0") => Some(false),
            Some("1") => Some(true),
            Some(_) => return Err(HeaderParseError::InvalidSampledFlag),
        };
        if parts.next().is_some() {
            return Err(HeaderParseError::InvalidFormat);
        }

        Ok(Self {
            trace_id,
            span_id,
            sampled,
        })
    }

    /// Serializes back to the `traceId-spanId[-sampledFlag]` form.
    ///
    /// The flag is emitted only when a sampling decision is present.
    pub fn to_header_value(&self) -> String {
        match self.sampled {
            Some(sampled) => format!(
                "{}-{}-{}",
                self.trace_id,
                self.span_id,
                if sampled { '1' } else { '0' }
            ),
            None => format!("{}-{}", self.trace_id, self.span_id),
        }
    }

    /// Returns the trace ID.
    pub fn trace_id(&self) -> &TraceId {
        &self.trace_id
    }

    /// Returns the span ID carried by the header.
    pub fn span_id(&self) -> &SpanId {
        &self.span_id
    }

    /// Returns the sampling decision, if the header carried one.
    pub fn sampled(&self) -> Option<bool> {
        self.sampled
    }
}

impl fmt::Display for TraceHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_header_value())
    }
}
