//! Trace continuation and header codec behavior across the public API.

use proptest::prelude::*;
use traceline::{
    DynamicSamplingContext, PropagationContext, SpanOptions, TraceHeader, continue_trace,
    continue_trace_context, scope,
};

use crate::common::sampled_tracer;

#[test]
fn continue_trace_without_headers_starts_fresh() {
    let context = continue_trace_context(None, None);
    assert!(context.parent_span_id().is_none());
    assert_eq!(context.sampled(), None);
    assert!(context.dsc().is_none());
}

#[test]
fn continue_trace_with_header_only_freezes_empty_dsc() {
    let context = continue_trace_context(
        Some("12312012123120121231201212312012-1121201211212012-0"),
        None,
    );

    assert_eq!(
        context.trace_id().to_string(),
        "12312012123120121231201212312012"
    );
    assert_eq!(
        context.parent_span_id().map(ToString::to_string).as_deref(),
        Some("1121201211212012")
    );
    assert_eq!(context.sampled(), Some(false));

    let dsc = context.dsc().expect("incoming trace freezes the dsc");
    assert!(dsc.is_empty());
}

#[test]
fn continue_trace_with_trace_and_baggage() {
    continue_trace(
        Some("12312012123120121231201212312012-1121201211212012-1"),
        Some("sentry-version=1.0,sentry-environment=production,dogs=great,cats=boring"),
        |context| {
            assert_eq!(context.sampled(), Some(true));
            assert_eq!(
                context.parent_span_id().map(ToString::to_string).as_deref(),
                Some("1121201211212012")
            );

            let dsc = context.dsc().unwrap();
            assert_eq!(dsc.len(), 2);
            assert_eq!(dsc.get("version"), Some("1.0"));
            assert_eq!(dsc.get("environment"), Some("production"));
        },
    );
}

#[test]
fn continue_trace_installs_and_restores_ambient_context() {
    let before = scope::current().propagation_context().clone();

    continue_trace(
        Some("12312012123120121231201212312012-1121201211212012-1"),
        None,
        |context| {
            let ambient = scope::current().propagation_context().clone();
            assert_eq!(&ambient, context);
        },
    );

    assert_eq!(scope::current().propagation_context(), &before);
}

#[test]
fn continue_trace_malformed_header_is_fail_open() {
    continue_trace(Some("garbage header"), Some("sentry-version=1.0"), |context| {
        assert!(context.parent_span_id().is_none());
        assert!(context.dsc().is_none());
    });
}

#[test]
fn spans_continue_the_incoming_trace() {
    let tracer = sampled_tracer();
    continue_trace(
        Some("12312012123120121231201212312012-1121201211212012-1"),
        None,
        |_| {
            tracer.start_span(SpanOptions::new("server span"), |span| {
                assert_eq!(
                    span.trace_id().to_string(),
                    "12312012123120121231201212312012"
                );
                assert_eq!(
                    span.parent_span_id().map(ToString::to_string).as_deref(),
                    Some("1121201211212012")
                );
                assert!(span.is_sampled());
            });
        },
    );
}

#[test]
fn unsampled_continuation_is_inherited() {
    let tracer = sampled_tracer();
    continue_trace(
        Some("12312012123120121231201212312012-1121201211212012-0"),
        None,
        |_| {
            tracer.start_span(SpanOptions::new("server span"), |span| {
                assert!(span.is_recording());
                assert!(!span.is_sampled());
            });
        },
    );
}

#[test]
fn active_span_header_feeds_downstream_continuation() {
    let tracer = sampled_tracer();
    tracer.start_span(SpanOptions::new("client span"), |span| {
        let header = span.trace_header().to_header_value();

        let downstream = PropagationContext::continue_from(Some(&header), None);
        assert_eq!(downstream.trace_id(), span.trace_id());
        assert_eq!(downstream.parent_span_id(), Some(span.span_id()));
        assert_eq!(downstream.sampled(), Some(true));
    });
}

#[test]
fn outgoing_baggage_roundtrips() {
    let mut dsc = DynamicSamplingContext::new();
    dsc.insert("environment", "production");
    dsc.insert("transaction", "GET /users");

    let baggage = dsc.to_baggage();
    let context = continue_trace_context(
        Some("12312012123120121231201212312012-1121201211212012-1"),
        Some(&baggage),
    );
    assert_eq!(context.dsc(), Some(&dsc));
}

proptest! {
    #[test]
    fn prop_header_roundtrip(
        trace in "[1-9a-f][0-9a-f]{31}",
        span in "[1-9a-f][0-9a-f]{15}",
        sampled in proptest::option::of(any::<bool>()),
    ) {
        let mut raw = format!("{trace}-{span}");
        if let Some(sampled) = sampled {
            raw.push('-');
            raw.push(if sampled { '1' } else { '0' });
        }

        let header = TraceHeader::parse(&raw).unwrap();
        prop_assert_eq!(header.trace_id().to_string(), trace);
        prop_assert_eq!(header.span_id().to_string(), span);
        prop_assert_eq!(header.sampled(), sampled);
        prop_assert_eq!(header.to_header_value(), raw);
    }

    #[test]
    fn prop_context_roundtrip_preserves_identity(sampled in any::<bool>()) {
        let context = PropagationContext::new_root().with_sampled(Some(sampled));
        let header = context.trace_header().to_header_value();
        let reparsed = PropagationContext::continue_from(Some(&header), None);

        prop_assert_eq!(reparsed.trace_id(), context.trace_id());
        prop_assert_eq!(reparsed.parent_span_id(), Some(context.span_id()));
        prop_assert_eq!(reparsed.sampled(), Some(sampled));
    }
}
