//! Renders recorded events as Chrome Trace Event Format JSON objects.
//!
//! Events are appended field by field into a reusable `String`; the
//! caller frames them into the surrounding array with
//! `trace_format::TraceArrayWriter`. Convertable arguments splice their
//! own JSON in verbatim here, which is the one point where they are
//! finally serialised.

use crate::event::{
    ArgValue, TraceEvent, TRACE_EVENT_FLAG_FLOW_IN, TRACE_EVENT_FLAG_FLOW_OUT,
    TRACE_EVENT_FLAG_HAS_ID,
};
use std::fmt::Write as _;

pub(crate) fn append_event_as_json(event: &TraceEvent, pid: u32, out: &mut String) {
    let _ = write!(
        out,
        "{{\"pid\":{},\"tid\":{},\"ts\":{}",
        pid, event.tid, event.timestamp_us
    );
    if let Some(tts) = event.thread_timestamp_us {
        let _ = write!(out, ",\"tts\":{tts}");
    }
    let _ = write!(out, ",\"ph\":\"{}\",\"cat\":", event.phase.as_char());
    append_json_string(out, event.category);
    out.push_str(",\"name\":");
    append_json_string(out, &event.name);
    if let Some(dur) = event.duration_us {
        let _ = write!(out, ",\"dur\":{dur}");
    }
    out.push_str(",\"args\":{");
    let mut first = true;
    for (name, value) in event.args.iter() {
        if !first {
            out.push(',');
        }
        first = false;
        append_json_string(out, name);
        out.push(':');
        append_arg_value(out, value);
    }
    out.push('}');
    if event.flags & TRACE_EVENT_FLAG_HAS_ID != 0 {
        let _ = write!(out, ",\"id\":\"0x{:x}\"", event.id);
    }
    if let Some(scope) = event.scope {
        out.push_str(",\"scope\":");
        append_json_string(out, scope);
    }
    if event.bind_id != 0 {
        let _ = write!(out, ",\"bind_id\":\"0x{:x}\"", event.bind_id);
    }
    if event.flags & TRACE_EVENT_FLAG_FLOW_IN != 0 {
        out.push_str(",\"flow_in\":true");
    }
    if event.flags & TRACE_EVENT_FLAG_FLOW_OUT != 0 {
        out.push_str(",\"flow_out\":true");
    }
    out.push('}');
}

/// The synthetic metadata event recorded when events were lost.
pub(crate) fn append_overflow_metadata(
    pid: u32,
    tid: i32,
    timestamp_us: i64,
    dropped: u64,
    out: &mut String,
) {
    let _ = write!(
        out,
        "{{\"pid\":{pid},\"tid\":{tid},\"ts\":{timestamp_us},\"ph\":\"M\",\
         \"cat\":\"__metadata\",\"name\":\"trace_buffer_overflowed\",\
         \"args\":{{\"dropped_events\":{dropped}}}}}"
    );
}

fn append_arg_value(out: &mut String, value: &ArgValue) {
    match value {
        ArgValue::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
        ArgValue::Int(v) => {
            let _ = write!(out, "{v}");
        }
        ArgValue::Uint(v) => {
            let _ = write!(out, "{v}");
        }
        ArgValue::Double(v) => append_double(out, *v),
        ArgValue::Pointer(v) => {
            let _ = write!(out, "\"0x{v:x}\"");
        }
        ArgValue::Str(v) => append_json_string(out, v),
        ArgValue::CopyStr(v) => append_json_string(out, v),
        ArgValue::Convertable(c) => c.append_as_trace_format(out),
    }
}

/// Non-finite doubles have no JSON representation; the Chrome format
/// spells them as strings.
fn append_double(out: &mut String, value: f64) {
    if value.is_nan() {
        out.push_str("\"NaN\"");
    } else if value.is_infinite() {
        out.push_str(if value > 0.0 {
            "\"Infinity\""
        } else {
            "\"-Infinity\""
        });
    } else if let Ok(rendered) = serde_json::to_string(&value) {
        out.push_str(&rendered);
    }
}

fn append_json_string(out: &mut String, s: &str) {
    if let Ok(quoted) = serde_json::to_string(s) {
        out.push_str(&quoted);
    }
}
