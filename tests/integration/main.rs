//! Integration tests for the traceline span engine.
//!
//! Every test builds its own [`Tracer`](traceline::Tracer), so hook
//! registries never leak between tests; the ambient scope is thread-local
//! and each test runs on its own thread.
//!
//! ```bash
//! cargo test --test integration
//! ```

mod async_tests;
mod common;
mod hook_tests;
mod propagation_tests;
