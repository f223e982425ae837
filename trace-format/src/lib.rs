//! Data model and streaming writer for the Chrome Trace Event Format.
//!
//! The format is a JSON array of event objects as consumed by
//! `chrome://tracing` and Perfetto's legacy JSON importer. This crate
//! provides:
//!
//! - [`TraceEvent`] / [`Phase`]: a serde model of one event object,
//!   usable both for emitting and for parsing recorded traces back.
//! - [`TraceArrayWriter`]: a streaming writer that frames events into
//!   the surrounding JSON array and hands coalesced byte chunks to a
//!   caller-supplied sink, so multi-megabyte traces never have to be
//!   materialised as one string.

use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io;

/// Event phase, serialised as the single-character `ph` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "B")]
    Begin,
    #[serde(rename = "E")]
    End,
    #[serde(rename = "X")]
    Complete,
    #[serde(rename = "i")]
    Instant,
    /// Older traces use `I` for instant events.
    #[serde(rename = "I")]
    InstantLegacy,
    #[serde(rename = "C")]
    Counter,
    #[serde(rename = "b")]
    AsyncBegin,
    #[serde(rename = "n")]
    AsyncInstant,
    #[serde(rename = "e")]
    AsyncEnd,
    #[serde(rename = "s")]
    FlowBegin,
    #[serde(rename = "t")]
    FlowStep,
    #[serde(rename = "f")]
    FlowEnd,
    #[serde(rename = "N")]
    ObjectCreated,
    #[serde(rename = "O")]
    ObjectSnapshot,
    #[serde(rename = "D")]
    ObjectDestroyed,
    #[serde(rename = "M")]
    Metadata,
    #[serde(rename = "P")]
    Sample,
    #[serde(rename = "R")]
    Mark,
}

/// One object of the trace array.
///
/// Field order follows the order the Chromium serialiser writes them in,
/// which keeps emitted traces diffable against Chrome's own output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct TraceEvent {
    pub pid: u32,
    pub tid: i32,
    /// Wall timestamp, monotonic microseconds.
    pub ts: i64,
    /// Thread CPU timestamp, microseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts: Option<i64>,
    pub ph: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cat: Option<String>,
    pub name: String,
    /// Duration of a complete event; absent while the scope is open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dur: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
    /// Async/object id, conventionally a `0x…` hex string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_in: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_out: Option<bool>,
    /// Instant event scope: `"t"` thread, `"p"` process, `"g"` global.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s: Option<String>,
}

/// Bytes buffered before the sink is invoked.
pub const DEFAULT_FLUSH_THRESHOLD: usize = 32 * 1024;

/// Streams a JSON array of events to a byte sink.
///
/// Events may be supplied either as [`TraceEvent`] values or as
/// pre-serialised JSON objects ([`write_serialized`]); the writer owns
/// the `[`, `,`, `]` framing. [`finish`] must be called to terminate the
/// array; an empty writer finishes to `[]`.
///
/// [`write_serialized`]: TraceArrayWriter::write_serialized
/// [`finish`]: TraceArrayWriter::finish
pub struct TraceArrayWriter<F> {
    sink: F,
    buf: Vec<u8>,
    wrote_any: bool,
    flush_threshold: usize,
}

impl<F> TraceArrayWriter<F>
where
    F: FnMut(&[u8]) -> io::Result<()>,
{
    pub fn new(sink: F) -> Self {
        Self::with_threshold(sink, DEFAULT_FLUSH_THRESHOLD)
    }

    pub fn with_threshold(sink: F, flush_threshold: usize) -> Self {
        TraceArrayWriter {
            sink,
            buf: Vec::with_capacity(flush_threshold.min(DEFAULT_FLUSH_THRESHOLD) + 256),
            wrote_any: false,
            flush_threshold,
        }
    }

    /// Appends one event, serialising it with serde.
    pub fn write_event(&mut self, event: &TraceEvent) -> io::Result<()> {
        let json = serde_json::to_string(event).map_err(io::Error::other)?;
        self.write_serialized(&json)
    }

    /// Appends one pre-serialised JSON object verbatim.
    pub fn write_serialized(&mut self, event_json: &str) -> io::Result<()> {
        if self.wrote_any {
            self.buf.push(b',');
        } else {
            self.buf.push(b'[');
            self.wrote_any = true;
        }
        self.buf.extend_from_slice(event_json.as_bytes());
        if self.buf.len() >= self.flush_threshold {
            self.flush_buf()?;
        }
        Ok(())
    }

    /// Terminates the array and drains the remaining bytes to the sink.
    pub fn finish(mut self) -> io::Result<()> {
        if !self.wrote_any {
            self.buf.push(b'[');
        }
        self.buf.push(b']');
        self.flush_buf()
    }

    fn flush_buf(&mut self) -> io::Result<()> {
        if !self.buf.is_empty() {
            (self.sink)(&self.buf)?;
            self.buf.clear();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn collect_writer() -> (TraceArrayWriter<impl FnMut(&[u8]) -> io::Result<()>>, std::rc::Rc<std::cell::RefCell<Vec<u8>>>) {
        let out = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink_out = out.clone();
        let writer = TraceArrayWriter::new(move |bytes: &[u8]| {
            sink_out.borrow_mut().extend_from_slice(bytes);
            Ok(())
        });
        (writer, out)
    }

    #[rstest]
    #[case(Phase::Begin, "B")]
    #[case(Phase::Complete, "X")]
    #[case(Phase::Instant, "i")]
    #[case(Phase::AsyncBegin, "b")]
    #[case(Phase::AsyncInstant, "n")]
    #[case(Phase::AsyncEnd, "e")]
    #[case(Phase::FlowStep, "t")]
    #[case(Phase::Metadata, "M")]
    fn phase_serializes_to_single_char(#[case] phase: Phase, #[case] expected: &str) {
        let json = serde_json::to_string(&phase).unwrap();
        assert_eq!(json, format!("\"{expected}\""));
        let back: Phase = serde_json::from_str(&json).unwrap();
        assert_eq!(back, phase);
    }

    #[rstest]
    fn event_skips_absent_fields() {
        let event = TraceEvent::builder()
            .pid(7)
            .tid(42)
            .ts(1000)
            .ph(Phase::Instant)
            .name("hello".to_string())
            .args(json!({}))
            .build();
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("dur"));
        assert!(!json.contains("bind_id"));
        assert!(json.contains("\"args\":{}"));
    }

    #[rstest]
    fn event_roundtrips_through_serde() {
        let event = TraceEvent::builder()
            .pid(1)
            .tid(2)
            .ts(3)
            .tts(4)
            .ph(Phase::Complete)
            .cat("gpu".to_string())
            .name("frame".to_string())
            .dur(125)
            .args(json!({"count": 3}))
            .build();
        let json = serde_json::to_string(&event).unwrap();
        let back: TraceEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[rstest]
    fn empty_writer_finishes_to_empty_array() {
        let (writer, out) = collect_writer();
        writer.finish().unwrap();
        assert_eq!(out.borrow().as_slice(), b"[]");
    }

    #[rstest]
    fn writer_frames_events_with_commas() {
        let (mut writer, out) = collect_writer();
        writer.write_serialized("{\"a\":1}").unwrap();
        writer.write_serialized("{\"b\":2}").unwrap();
        writer.finish().unwrap();
        assert_eq!(out.borrow().as_slice(), b"[{\"a\":1},{\"b\":2}]");
    }

    #[rstest]
    fn writer_flushes_at_threshold() {
        let chunks = std::rc::Rc::new(std::cell::RefCell::new(0usize));
        let sink_chunks = chunks.clone();
        let mut writer = TraceArrayWriter::with_threshold(
            move |_bytes: &[u8]| {
                *sink_chunks.borrow_mut() += 1;
                Ok(())
            },
            16,
        );
        for _ in 0..8 {
            writer.write_serialized("{\"k\":123456}").unwrap();
        }
        let before_finish = *chunks.borrow();
        assert!(before_finish > 1, "expected intermediate flushes");
        writer.finish().unwrap();
    }

    #[rstest]
    fn writer_propagates_sink_errors() {
        let mut writer = TraceArrayWriter::with_threshold(
            |_bytes: &[u8]| Err(io::Error::other("sink closed")),
            4,
        );
        let err = writer
            .write_serialized("{\"oversized\":true}")
            .expect_err("sink error must surface");
        assert_eq!(err.to_string(), "sink closed");
    }

    #[rstest]
    fn parses_chrome_style_array() {
        let raw = r#"[
            {"pid":1,"tid":1,"ts":10,"ph":"X","cat":"cc","name":"draw","dur":5,"args":{}},
            {"pid":1,"tid":1,"ts":20,"ph":"b","cat":"net","name":"req","id":"0xab","args":{}}
        ]"#;
        let events: Vec<TraceEvent> = serde_json::from_str(raw).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].ph, Phase::Complete);
        assert_eq!(events[1].id.as_deref(), Some("0xab"));
    }
}
