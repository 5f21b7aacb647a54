//! Shared harness for span engine integration tests.

use std::sync::{Arc, Mutex};

use traceline::{Tracer, TracerBuilder};

/// A tracer that samples everything.
pub fn sampled_tracer() -> Tracer {
    TracerBuilder::new().sample_rate(1.0).build()
}

/// Records hook firings by span name, in order.
#[derive(Clone, Default)]
pub struct HookRecorder {
    started: Arc<Mutex<Vec<String>>>,
    ended: Arc<Mutex<Vec<String>>>,
    transactions: Arc<Mutex<Vec<(String, Vec<String>)>>>,
}

impl HookRecorder {
    /// Subscribes a fresh recorder to all three hooks of `tracer`.
    pub fn attach(tracer: &Tracer) -> Self {
        let recorder = Self::default();

        let started = recorder.started.clone();
        tracer.on_span_start(move |span| {
            started.lock().unwrap().push(span.name());
        });

        let ended = recorder.ended.clone();
        tracer.on_span_end(move |span| {
            ended.lock().unwrap().push(span.name());
        });

        let transactions = recorder.transactions.clone();
        tracer.on_finish_transaction(move |span, descendants| {
            let names = descendants.iter().map(|s| s.name()).collect();
            transactions.lock().unwrap().push((span.name(), names));
        });

        recorder
    }

    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    pub fn ended(&self) -> Vec<String> {
        self.ended.lock().unwrap().clone()
    }

    pub fn transactions(&self) -> Vec<(String, Vec<String>)> {
        self.transactions.lock().unwrap().clone()
    }
}
