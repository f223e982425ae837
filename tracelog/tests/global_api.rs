//! The global engine, the free-function API, and the macros.
//!
//! Everything lives in one test because the process-wide instance is
//! shared state; parallel sessions would step on each other.

use std::sync::atomic::{AtomicUsize, Ordering};
use trace_format::{Phase, TraceEvent as JsonEvent};
use tracelog::{
    trace_counter, trace_event_begin, trace_event_end, trace_event_instant, trace_event_scoped,
    RecordMode, TraceArguments, TraceId,
};

fn flush_global() -> Vec<JsonEvent> {
    let mut out = Vec::new();
    tracelog::flush(|bytes| {
        out.extend_from_slice(bytes);
        Ok(())
    })
    .unwrap();
    serde_json::from_slice(&out).unwrap()
}

#[test]
fn global_engine_end_to_end() {
    assert!(!tracelog::is_enabled());
    tracelog::enable("*", RecordMode::RecordContinuously).unwrap();
    assert!(tracelog::is_enabled());
    assert_eq!(tracelog::num_sessions(), 1);

    trace_event_instant!("app", "boot", "version" => "1.2.3");
    trace_event_begin!("app", "load");
    trace_event_end!("app", "load");
    {
        let _span = trace_event_scoped!("app", "frame", "index" => 7i64);
    }
    trace_counter!("app", "fps", 60);
    tracelog::event_async_begin("net", "fetch", TraceId::Raw(0x1), TraceArguments::none());
    tracelog::event_async_end("net", "fetch", TraceId::Raw(0x1), TraceArguments::none());
    tracelog::event_flow_begin("sched", "task", 0x9, TraceArguments::none());
    tracelog::event_flow_end("sched", "task", 0x9, TraceArguments::none());

    // The same call sites again, to exercise the cached category path.
    trace_event_instant!("app", "boot", "version" => "1.2.3");

    tracelog::disable();
    assert!(!tracelog::is_enabled());
    let events = flush_global();

    assert_eq!(
        events.iter().filter(|e| e.name == "boot").count(),
        2,
        "cached call site must still record"
    );
    let boot = events.iter().find(|e| e.name == "boot").unwrap();
    assert_eq!(boot.args.as_ref().unwrap()["version"], "1.2.3");

    let frame = events.iter().find(|e| e.name == "frame").unwrap();
    assert_eq!(frame.ph, Phase::Complete);
    assert!(frame.dur.is_some());
    assert_eq!(frame.args.as_ref().unwrap()["index"], 7);

    let fps = events.iter().find(|e| e.name == "fps").unwrap();
    assert_eq!(fps.ph, Phase::Counter);
    assert_eq!(fps.args.as_ref().unwrap()["value"], 60);

    assert!(events.iter().any(|e| e.ph == Phase::AsyncBegin));
    assert!(events.iter().any(|e| e.ph == Phase::FlowEnd));

    // Disabled call sites cost nothing, record nothing, and leave
    // their argument expressions unevaluated.
    static ARG_EVALS: AtomicUsize = AtomicUsize::new(0);
    fn costly_arg() -> i64 {
        ARG_EVALS.fetch_add(1, Ordering::SeqCst);
        99
    }
    trace_event_instant!("app", "after-disable", "cost" => costly_arg());
    {
        let _span = trace_event_scoped!("app", "after-disable-span", "cost" => costly_arg());
    }
    assert_eq!(ARG_EVALS.load(Ordering::SeqCst), 0);
    assert_eq!(flush_global().len(), 0);
}
