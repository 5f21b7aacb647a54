//! Ordering and payload guarantees of the lifecycle hooks.

use std::sync::{Arc, Mutex};

use traceline::SpanOptions;

use crate::common::{HookRecorder, sampled_tracer};

#[test]
fn span_hooks_fire_in_creation_and_completion_order() {
    let tracer = sampled_tracer();
    let recorder = HookRecorder::attach(&tracer);

    tracer.start_span(SpanOptions::new("span1"), |_| {
        tracer.start_span(SpanOptions::new("span2"), |_| {
            let span3 = tracer.start_inactive_span(SpanOptions::new("span3"));

            tracer.start_span_manual(SpanOptions::new("span5"), |_, finisher| {
                let _span4 = tracer.start_inactive_span(SpanOptions::new("span4"));
                finisher.finish();
            });

            span3.end();
        });
    });

    assert_eq!(
        recorder.started(),
        vec!["span1", "span2", "span3", "span5", "span4"]
    );
    // span4 was never ended and is therefore absent
    assert_eq!(recorder.ended(), vec!["span5", "span3", "span2", "span1"]);
}

#[test]
fn ending_twice_fires_span_end_once() {
    let tracer = sampled_tracer();
    let recorder = HookRecorder::attach(&tracer);

    let span = tracer.start_inactive_span(SpanOptions::new("once"));
    span.end();
    span.end();

    assert_eq!(recorder.ended(), vec!["once"]);
    assert_eq!(recorder.transactions().len(), 1);
}

#[test]
fn finish_transaction_fires_only_for_segments() {
    let tracer = sampled_tracer();
    let recorder = HookRecorder::attach(&tracer);

    tracer.start_span(SpanOptions::new("transaction"), |_| {
        tracer.start_span(SpanOptions::new("plain span"), |_| {});
    });

    assert_eq!(recorder.ended(), vec!["plain span", "transaction"]);
    assert_eq!(
        recorder.transactions(),
        vec![(
            "transaction".to_string(),
            vec!["transaction".to_string(), "plain span".to_string()]
        )]
    );
}

#[test]
fn finish_transaction_fires_immediately_after_span_end() {
    let tracer = sampled_tracer();
    let order: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    let sink = order.clone();
    tracer.on_span_end(move |span| {
        sink.lock().unwrap().push(format!("end:{}", span.name()));
    });
    let sink = order.clone();
    tracer.on_finish_transaction(move |span, _| {
        sink.lock().unwrap().push(format!("tx:{}", span.name()));
    });

    tracer.start_span(SpanOptions::new("outer"), |_| {
        tracer.start_span(SpanOptions::new("inner"), |_| {});
    });

    assert_eq!(
        order.lock().unwrap().clone(),
        vec!["end:inner", "end:outer", "tx:outer"]
    );
}

#[test]
fn listeners_run_in_registration_order() {
    let tracer = sampled_tracer();
    let order: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));

    for id in 0..3 {
        let sink = order.clone();
        tracer.on_span_start(move |_| {
            sink.lock().unwrap().push(id);
        });
    }

    tracer.start_span(SpanOptions::new("span"), |_| {});
    assert_eq!(order.lock().unwrap().clone(), vec![0, 1, 2]);
}

#[test]
fn aggregated_descendants_exclude_forced_sub_transactions() {
    let tracer = sampled_tracer();
    let recorder = HookRecorder::attach(&tracer);

    tracer.start_span(SpanOptions::new("outer"), |_| {
        tracer.start_span(SpanOptions::new("child a"), |_| {
            tracer.start_span(SpanOptions::new("grandchild"), |_| {});
        });
        let forced = SpanOptions::builder()
            .name("forced")
            .force_transaction(true)
            .build();
        tracer.start_span(forced, |_| {
            tracer.start_span(SpanOptions::new("forced child"), |_| {});
        });
        tracer.start_span(SpanOptions::new("child b"), |_| {});
    });

    let transactions = recorder.transactions();
    assert_eq!(transactions.len(), 2);
    assert_eq!(
        transactions[0],
        (
            "forced".to_string(),
            vec!["forced".to_string(), "forced child".to_string()]
        )
    );
    assert_eq!(
        transactions[1],
        (
            "outer".to_string(),
            vec![
                "outer".to_string(),
                "child a".to_string(),
                "grandchild".to_string(),
                "child b".to_string(),
            ]
        )
    );
}

#[test]
fn unfinished_children_still_appear_in_the_aggregate() {
    let tracer = sampled_tracer();
    let recorder = HookRecorder::attach(&tracer);

    tracer.start_span(SpanOptions::new("root"), |_| {
        let dangling = tracer.start_inactive_span(SpanOptions::new("dangling"));
        // never ended; the tree still lists it
        let _ = dangling;
    });

    assert_eq!(
        recorder.transactions(),
        vec![(
            "root".to_string(),
            vec!["root".to_string(), "dangling".to_string()]
        )]
    );
    assert_eq!(recorder.ended(), vec!["root"]);
}
