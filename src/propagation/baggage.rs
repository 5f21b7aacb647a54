//! Baggage header codec and the dynamic sampling context.
//!
//! A baggage header is a comma-separated list of `key=value` pairs. Only
//! entries whose key carries the reserved vendor prefix contribute to the
//! dynamic sampling context; everything else belongs to third parties and
//! is left untouched.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Name of the baggage header.
pub const BAGGAGE_HEADER_NAME: &str = "baggage";

/// Reserved key prefix for entries owned by this engine.
pub const BAGGAGE_KEY_PREFIX: &str = "sentry-";

/// Vendor-scoped key/value metadata carried in baggage headers.
///
/// A dynamic sampling context influences sampling decisions made further
/// downstream. An instance may be empty; "empty but frozen" is a distinct
/// state from "never observed", which is modelled as
/// `Option<DynamicSamplingContext>` being `None` on the propagation context.
///
/// ## Example
///
/// ```rust
/// use traceline::DynamicSamplingContext;
///
/// let dsc = DynamicSamplingContext::from_baggage(
///     "sentry-version=1.0,sentry-environment=production,dogs=great"
/// );
///
/// assert_eq!(dsc.get("version"), Some("1.0"));
/// assert_eq!(dsc.get("environment"), Some("production"));
/// // third-party entries are dropped
/// assert_eq!(dsc.get("dogs"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DynamicSamplingContext {
    entries: BTreeMap<String, String>,
}

impl DynamicSamplingContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a baggage header into a dynamic sampling context.
    ///
    /// Entries are split on `,` and trimmed; keys and values are
    /// percent-decoded. Only keys carrying [`BAGGAGE_KEY_PREFIX`] are
    /// retained, with the prefix stripped. Later duplicates overwrite
    /// earlier ones. Malformed entries are skipped, never an error.
    pub fn from_baggage(header: &str) -> Self {
        let mut entries = BTreeMap::new();
        for entry in header.split(',') {
            let entry = entry.trim();
            let Some((key, value)) = entry.split_once('=') else {
                continue;
            };
            let key = decode_component(key.trim());
            let Some(key) = key.strip_prefix(BAGGAGE_KEY_PREFIX) else {
                continue;
            };
            if key.is_empty() {
                continue;
            }
            entries.insert(key.to_owned(), decode_component(value.trim()));
        }
        Self { entries }
    }

    /// Serializes the context back into a baggage header value.
    ///
    /// Keys get the vendor prefix back and values are percent-encoded.
    pub fn to_baggage(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            if !out.is_empty() {
                out.push(',');
            }
            out.push_str(BAGGAGE_KEY_PREFIX);
            out.push_str(key);
            out.push('=');
            out.push_str(&urlencoding::encode(value));
        }
        out
    }

    /// Returns the value for a (prefix-stripped) key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|v| v.as_str())
    }

    /// Inserts an entry, replacing any previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Returns `true` if the context holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates over the entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for DynamicSamplingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_baggage())
    }
}

fn decode_component(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        // Invalid percent escapes are carried through verbatim
        Err(_) => raw.to_owned(),
    }
}
