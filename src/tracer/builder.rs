//! Builder for [`Tracer`] instances.

use std::sync::Arc;

use super::{Tracer, TracerInner};
use crate::hooks::HookBus;
use crate::sampling::{Sampler, SamplingContext, SamplingDecider};

/// Builder for creating [`Tracer`] instances.
///
/// Without a sample rate or sampler, tracing stays inactive and every span
/// request yields a non-recording placeholder. When both are configured,
/// the sampler wins.
///
/// ## Example
///
/// ```rust
/// use traceline::Tracer;
///
/// let tracer = Tracer::builder()
///     .sample_rate(0.25)
///     .environment("production")
///     .release("backend@1.4.2")
///     .build();
/// # let _ = tracer;
/// ```
pub struct TracerBuilder {
    sample_rate: Option<f64>,
    sampler: Option<Sampler>,
    environment: Option<String>,
    release: Option<String>,
}

impl TracerBuilder {
    /// Creates a builder with tracing inactive.
    pub fn new() -> Self {
        Self {
            sample_rate: None,
            sampler: None,
            environment: None,
            release: None,
        }
    }

    /// Sets the fixed sample rate applied to trace roots, in [0.0, 1.0].
    ///
    /// Values outside the range disable sampling rather than erroring.
    #[must_use]
    pub fn sample_rate(mut self, rate: f64) -> Self {
        self.sample_rate = Some(rate);
        self
    }

    /// Sets a custom sampling predicate, evaluated once per trace root.
    ///
    /// Takes precedence over [`sample_rate`](Self::sample_rate) when both
    /// are configured. A panicking predicate counts as "not sampled".
    #[must_use]
    pub fn sampler(
        mut self,
        sampler: impl Fn(&SamplingContext) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.sampler = Some(Arc::new(sampler));
        self
    }

    /// Sets the environment reported in generated dynamic sampling contexts.
    #[must_use]
    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Sets the release reported in generated dynamic sampling contexts.
    #[must_use]
    pub fn release(mut self, release: impl Into<String>) -> Self {
        self.release = Some(release.into());
        self
    }

    /// Builds the tracer.
    pub fn build(self) -> Tracer {
        Tracer {
            inner: Arc::new(TracerInner {
                decider: SamplingDecider::new(self.sample_rate, self.sampler),
                environment: self.environment,
                release: self.release,
                hooks: Arc::new(HookBus::new()),
            }),
        }
    }
}

impl Default for TracerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TracerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TracerBuilder")
            .field("sample_rate", &self.sample_rate)
            .field("sampler", &self.sampler.as_ref().map(|_| "<fn>"))
            .field("environment", &self.environment)
            .field("release", &self.release)
            .finish()
    }
}
