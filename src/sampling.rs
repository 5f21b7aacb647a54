//! Sampling decisions for root spans.
//!
//! The decision for a trace is made exactly once, at its local root, and
//! inherited verbatim by every descendant. Only two knobs exist: a fixed
//! sample rate, or a custom predicate that sees the would-be root span's
//! context. The predicate takes precedence when both are configured.

use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::span::SpanValue;

/// What a custom sampler sees when deciding a root span.
#[derive(Debug, Clone)]
pub struct SamplingContext {
    /// The span name.
    pub name: String,
    /// The operation category, if set.
    pub op: Option<String>,
    /// The merged attributes the span will start with.
    pub attributes: BTreeMap<String, SpanValue>,
    /// The upstream decision, if the trace was continued without one being
    /// authoritative (always `None` when the sampler actually runs).
    pub parent_sampled: Option<bool>,
}

/// A custom sampling predicate.
pub type Sampler = Arc<dyn Fn(&SamplingContext) -> bool + Send + Sync>;

/// Computes root sampling decisions from the configured rate or predicate.
pub(crate) struct SamplingDecider {
    sample_rate: Option<f64>,
    sampler: Option<Sampler>,
}

impl SamplingDecider {
    pub(crate) fn new(sample_rate: Option<f64>, sampler: Option<Sampler>) -> Self {
        Self {
            sample_rate,
            sampler,
        }
    }

    /// Tracing is active only when some sampling configuration exists.
    pub(crate) fn is_enabled(&self) -> bool {
        self.sample_rate.is_some() || self.sampler.is_some()
    }

    /// Returns the configured fixed rate, if any.
    pub(crate) fn sample_rate(&self) -> Option<f64> {
        self.sample_rate
    }

    /// Decides a root span with no inherited decision.
    ///
    /// A panicking predicate fails closed to `false`. A rate outside
    /// [0.0, 1.0] never samples.
    pub(crate) fn decide_root(&self, ctx: &SamplingContext) -> bool {
        if let Some(sampler) = &self.sampler {
            return match catch_unwind(AssertUnwindSafe(|| sampler(ctx))) {
                Ok(decision) => decision,
                Err(_) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(name = %ctx.name, "sampler panicked; span not sampled");
                    false
                }
            };
        }
        if let Some(rate) = self.sample_rate {
            if !(0.0..=1.0).contains(&rate) {
                #[cfg(feature = "tracing")]
                tracing::warn!(rate, "sample rate out of range; span not sampled");
                return false;
            }
            return fastrand::f64() < rate;
        }
        false
    }
}

impl std::fmt::Debug for SamplingDecider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamplingDecider")
            .field("sample_rate", &self.sample_rate)
            .field("sampler", &self.sampler.as_ref().map(|_| "<fn>"))
            .finish()
    }
}
