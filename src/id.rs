//! Trace and span identifiers.

use std::fmt;

use serde::{Serialize, Serializer};

/// Error parsing a trace or span identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum IdParseError {
    /// The trace id was not 32 lowercase hex characters.
    #[error("trace id must be 32 lowercase hex characters")]
    InvalidTraceId,
    /// The span id was not 16 lowercase hex characters.
    #[error("span id must be 16 lowercase hex characters")]
    InvalidSpanId,
}

/// A 128-bit trace identifier.
///
/// Rendered as 32 lowercase hex characters. Every span belonging to one
/// logical trace shares the same trace id, including spans on the far side
/// of a forced transaction boundary.
///
/// ## Example
///
/// ```rust
/// use traceline::TraceId;
///
/// let id = TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap();
/// assert_eq!(id.to_string(), "4bf92f3577b34da6a3ce929d0e0e4736");
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TraceId([u8; 16]);

impl TraceId {
    /// Creates a new random trace ID.
    pub fn random() -> Self {
        let mut bytes = [0u8; 16];
        getrandom::getrandom(&mut bytes).expect("Failed to generate random bytes");
        Self(bytes)
    }

    /// Creates a trace ID from bytes.
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Creates a trace ID from a 32-character lowercase hex string.
    pub fn from_hex(hex: &str) -> Result<Self, IdParseError> {
        if hex.len() != 32 || !is_lowercase_hex(hex) {
            return Err(IdParseError::InvalidTraceId);
        }
        let mut bytes = [0u8; 16];
        hex::decode_to_slice(hex, &mut bytes).map_err(|_| IdParseError::InvalidTraceId)?;

        // All-zero trace ids are reserved as invalid on the wire
        if bytes == [0u8; 16] {
            return Err(IdParseError::InvalidTraceId);
        }

        Ok(Self(bytes))
    }

    /// Returns the trace ID as bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Debug for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TraceId({})", self)
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Serialize for TraceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// A 64-bit span identifier.
///
/// Rendered as 16 lowercase hex characters, unique per span instance.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SpanId([u8; 8]);

impl SpanId {
    /// Creates a new random span ID.
    pub fn random() -> Self {
        let mut bytes = [0u8; 8];
        getrandom::getrandom(&mut bytes).expect("Failed to generate random bytes");
        Self(bytes)
    }

    /// Creates a span ID from bytes.
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    /// Creates a span ID from a 16-character lowercase hex string.
    pub fn from_hex(hex: &str) -> Result<Self, IdParseError> {
        if hex.len() != 16 || !is_lowercase_hex(hex) {
            return Err(IdParseError::InvalidSpanId);
        }
        let mut bytes = [0u8; 8];
        hex::decode_to_slice(hex, &mut bytes).map_err(|_| IdParseError::InvalidSpanId)?;

        // All-zero span ids are reserved as invalid on the wire
        if bytes == [0u8; 8] {
            return Err(IdParseError::InvalidSpanId);
        }

        Ok(Self(bytes))
    }

    /// Returns the span ID as bytes.
    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl fmt::Debug for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpanId({})", self)
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Serialize for SpanId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

fn is_lowercase_hex(s: &str) -> bool {
    s.bytes()
        .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
