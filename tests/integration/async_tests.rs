//! Scope propagation across asynchronous control flow.

use traceline::{ScopedFutureExt, SpanOptions, scope};

use crate::common::{HookRecorder, sampled_tracer};

#[tokio::test]
async fn async_span_stays_active_across_awaits() {
    let tracer = sampled_tracer();

    tracer
        .start_span_async(SpanOptions::new("async op"), |span| async move {
            let active = scope::active_span().expect("span active before suspension");
            assert_eq!(active.span_id(), span.span_id());

            tokio::task::yield_now().await;

            let active = scope::active_span().expect("span active after suspension");
            assert_eq!(active.span_id(), span.span_id());
        })
        .await;
}

#[tokio::test]
async fn async_spans_nest_like_sync_spans() {
    let tracer = sampled_tracer();
    let recorder = HookRecorder::attach(&tracer);

    tracer
        .start_span_async(SpanOptions::new("outer"), |outer| {
            let tracer = tracer.clone();
            async move {
                tokio::task::yield_now().await;
                tracer
                    .start_span_async(SpanOptions::new("inner"), |inner| async move {
                        assert_eq!(inner.trace_id(), outer.trace_id());
                        assert_eq!(inner.parent_span_id(), Some(outer.span_id()));
                    })
                    .await;
            }
        })
        .await;

    assert_eq!(recorder.started(), vec!["outer", "inner"]);
    assert_eq!(recorder.ended(), vec!["inner", "outer"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_tasks_do_not_share_active_spans() {
    let tracer = sampled_tracer();

    let mut handles = Vec::new();
    for name in ["task-a", "task-b", "task-c"] {
        let tracer = tracer.clone();
        handles.push(tokio::spawn(
            async move {
                tracer
                    .start_span_async(SpanOptions::new(name), |span| async move {
                        for _ in 0..8 {
                            let active = scope::active_span().expect("own span active");
                            assert_eq!(active.span_id(), span.span_id());
                            tokio::task::yield_now().await;
                        }
                    })
                    .await;
            }
            .bind_current_scope(),
        ));
    }

    for handle in handles {
        handle.await.expect("task panicked");
    }
}

#[tokio::test]
async fn spawned_task_carries_bound_scope() {
    let tracer = sampled_tracer();

    let parent_id = tracer
        .start_span_async(SpanOptions::new("request"), |span| {
            let tracer = tracer.clone();
            async move {
                let expected = span.span_id().clone();
                let handle = tokio::spawn(
                    async move {
                        // the spawned task still sees the caller's active span
                        let active = scope::active_span().expect("inherited span");
                        let parent = active.span_id().clone();

                        let expected_parent = parent.clone();
                        tracer
                            .start_span_async(SpanOptions::new("background"), |child| async move {
                                assert_eq!(child.parent_span_id(), Some(&expected_parent));
                            })
                            .await;
                        parent
                    }
                    .bind_current_scope(),
                );
                let seen = handle.await.expect("task panicked");
                assert_eq!(seen, expected);
                expected
            }
        })
        .await;

    assert!(scope::active_span().is_none());
    let _ = parent_id;
}

#[tokio::test]
async fn async_error_path_marks_and_rethrows() {
    let tracer = sampled_tracer();
    let recorder = HookRecorder::attach(&tracer);

    let result: Result<(), String> = tracer
        .try_start_span_async(SpanOptions::new("fallible"), |_| async {
            tokio::task::yield_now().await;
            Err("async bad".to_string())
        })
        .await;

    assert_eq!(result, Err("async bad".to_string()));
    assert_eq!(recorder.ended(), vec!["fallible"]);
}

#[tokio::test]
async fn async_return_value_passes_through() {
    let tracer = sampled_tracer();
    let value = tracer
        .start_span_async(SpanOptions::new("compute"), |_| async {
            tokio::task::yield_now().await;
            "async good"
        })
        .await;
    assert_eq!(value, "async good");
}
