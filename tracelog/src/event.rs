//! Event records, argument values, and id resolution.

use std::borrow::Cow;
use std::fmt;

/// Event phase, stored as the Chrome format's single-character codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TracePhase {
    Begin = b'B',
    End = b'E',
    Complete = b'X',
    Instant = b'i',
    Counter = b'C',
    AsyncBegin = b'b',
    AsyncStep = b'n',
    AsyncEnd = b'e',
    FlowBegin = b's',
    FlowStep = b't',
    FlowEnd = b'f',
    ObjectCreated = b'N',
    ObjectSnapshot = b'O',
    ObjectDeleted = b'D',
    Metadata = b'M',
    Sample = b'P',
    Mark = b'R',
}

impl TracePhase {
    #[inline]
    pub fn as_char(self) -> char {
        self as u8 as char
    }
}

pub const TRACE_EVENT_FLAG_NONE: u16 = 0;
pub const TRACE_EVENT_FLAG_COPY: u16 = 1 << 0;
pub const TRACE_EVENT_FLAG_HAS_ID: u16 = 1 << 1;
pub const TRACE_EVENT_FLAG_MANGLE_ID: u16 = 1 << 2;
pub const TRACE_EVENT_FLAG_EXPLICIT_TIMESTAMP: u16 = 1 << 5;
pub const TRACE_EVENT_FLAG_FLOW_IN: u16 = 1 << 8;
pub const TRACE_EVENT_FLAG_FLOW_OUT: u16 = 1 << 9;

/// An argument that serialises itself when the trace is flushed.
///
/// Implementations append a single valid JSON value. Serialisation is
/// deferred until flush, so an expensive-to-render argument costs
/// nothing on the emit path beyond moving the box.
pub trait ConvertableToTraceFormat: Send {
    fn append_as_trace_format(&self, out: &mut String);
}

impl ConvertableToTraceFormat for serde_json::Value {
    fn append_as_trace_format(&self, out: &mut String) {
        out.push_str(&self.to_string());
    }
}

/// One trace argument value.
pub enum ArgValue {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Double(f64),
    /// Serialised as a `0x…` hex string.
    Pointer(u64),
    Str(&'static str),
    CopyStr(String),
    Convertable(Box<dyn ConvertableToTraceFormat>),
}

impl fmt::Debug for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Bool(v) => write!(f, "Bool({v})"),
            ArgValue::Int(v) => write!(f, "Int({v})"),
            ArgValue::Uint(v) => write!(f, "Uint({v})"),
            ArgValue::Double(v) => write!(f, "Double({v})"),
            ArgValue::Pointer(v) => write!(f, "Pointer({v:#x})"),
            ArgValue::Str(v) => write!(f, "Str({v:?})"),
            ArgValue::CopyStr(v) => write!(f, "CopyStr({v:?})"),
            ArgValue::Convertable(_) => f.write_str("Convertable(..)"),
        }
    }
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        ArgValue::Bool(v)
    }
}

impl From<i32> for ArgValue {
    fn from(v: i32) -> Self {
        ArgValue::Int(v as i64)
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        ArgValue::Int(v)
    }
}

impl From<u32> for ArgValue {
    fn from(v: u32) -> Self {
        ArgValue::Uint(v as u64)
    }
}

impl From<u64> for ArgValue {
    fn from(v: u64) -> Self {
        ArgValue::Uint(v)
    }
}

impl From<f64> for ArgValue {
    fn from(v: f64) -> Self {
        ArgValue::Double(v)
    }
}

impl From<&'static str> for ArgValue {
    fn from(v: &'static str) -> Self {
        ArgValue::Str(v)
    }
}

impl From<String> for ArgValue {
    fn from(v: String) -> Self {
        ArgValue::CopyStr(v)
    }
}

impl From<serde_json::Value> for ArgValue {
    fn from(v: serde_json::Value) -> Self {
        ArgValue::Convertable(Box::new(v))
    }
}

impl From<Box<dyn ConvertableToTraceFormat>> for ArgValue {
    fn from(v: Box<dyn ConvertableToTraceFormat>) -> Self {
        ArgValue::Convertable(v)
    }
}

/// Up to two named arguments, inline and allocation-free for the
/// primitive variants.
#[derive(Debug, Default)]
pub struct TraceArguments {
    args: [Option<(&'static str, ArgValue)>; 2],
}

impl TraceArguments {
    pub fn none() -> Self {
        TraceArguments::default()
    }

    pub fn one(name: &'static str, value: impl Into<ArgValue>) -> Self {
        TraceArguments {
            args: [Some((name, value.into())), None],
        }
    }

    pub fn two(
        name1: &'static str,
        value1: impl Into<ArgValue>,
        name2: &'static str,
        value2: impl Into<ArgValue>,
    ) -> Self {
        TraceArguments {
            args: [Some((name1, value1.into())), Some((name2, value2.into()))],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.args[0].is_none()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(&'static str, ArgValue)> {
        self.args.iter().flatten()
    }
}

/// An async/object/flow id and its mangling policy.
///
/// Pointer-derived ids are XORed with the process id so ids from
/// different processes in one merged trace do not collide. `DontMangle`
/// and `ForceMangle` override the default per id.
#[derive(Debug, Clone, Copy)]
pub enum TraceId {
    None,
    Raw(u64),
    Pointer(*const ()),
    DontMangle(u64),
    ForceMangle(u64),
    WithScope(&'static str, u64),
}

impl TraceId {
    /// Resolves to (raw id, scope, flags to OR into the event).
    pub(crate) fn resolve(self) -> (u64, Option<&'static str>, u16) {
        match self {
            TraceId::None => (0, None, 0),
            TraceId::Raw(id) | TraceId::DontMangle(id) => (id, None, TRACE_EVENT_FLAG_HAS_ID),
            TraceId::Pointer(p) => (
                p as u64,
                None,
                TRACE_EVENT_FLAG_HAS_ID | TRACE_EVENT_FLAG_MANGLE_ID,
            ),
            TraceId::ForceMangle(id) => (
                id,
                None,
                TRACE_EVENT_FLAG_HAS_ID | TRACE_EVENT_FLAG_MANGLE_ID,
            ),
            TraceId::WithScope(scope, id) => (id, Some(scope), TRACE_EVENT_FLAG_HAS_ID),
        }
    }
}

/// Handle to a recorded event, used to patch a complete event's
/// duration when its scope closes. Stale once the chunk it points into
/// has been recycled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventHandle {
    pub(crate) chunk_seq: u32,
    pub(crate) event_index: u16,
}

/// A recorded event as held in chunk and ring storage.
#[derive(Debug)]
pub struct TraceEvent {
    pub phase: TracePhase,
    pub category: &'static str,
    pub name: Cow<'static, str>,
    pub scope: Option<&'static str>,
    pub id: u64,
    pub bind_id: u64,
    pub tid: i32,
    pub timestamp_us: i64,
    pub thread_timestamp_us: Option<i64>,
    /// Set when a complete event's scope closes; `None` while open.
    pub duration_us: Option<i64>,
    pub flags: u16,
    pub args: TraceArguments,
}

impl TraceEvent {
    /// Closes a complete event. First close wins.
    pub(crate) fn finish(&mut self, end_timestamp_us: i64) {
        if self.phase == TracePhase::Complete && self.duration_us.is_none() {
            self.duration_us = Some((end_timestamp_us - self.timestamp_us).max(0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(TracePhase::Complete, 'X')]
    #[case(TracePhase::AsyncBegin, 'b')]
    #[case(TracePhase::AsyncStep, 'n')]
    #[case(TracePhase::AsyncEnd, 'e')]
    #[case(TracePhase::FlowBegin, 's')]
    #[case(TracePhase::Instant, 'i')]
    fn phase_chars_match_chrome_format(#[case] phase: TracePhase, #[case] expected: char) {
        assert_eq!(phase.as_char(), expected);
    }

    #[rstest]
    fn raw_id_carries_has_id_only() {
        let (id, scope, flags) = TraceId::Raw(0xab).resolve();
        assert_eq!(id, 0xab);
        assert_eq!(scope, None);
        assert_eq!(flags, TRACE_EVENT_FLAG_HAS_ID);
    }

    #[rstest]
    fn pointer_id_requests_mangling() {
        let marker = 7u32;
        let (_, _, flags) = TraceId::Pointer(&marker as *const u32 as *const ()).resolve();
        assert_ne!(flags & TRACE_EVENT_FLAG_MANGLE_ID, 0);
    }

    #[rstest]
    fn scoped_id_keeps_its_scope() {
        let (id, scope, _) = TraceId::WithScope("net", 9).resolve();
        assert_eq!(id, 9);
        assert_eq!(scope, Some("net"));
    }

    #[rstest]
    fn conversions_pick_the_right_variant() {
        assert!(matches!(ArgValue::from(true), ArgValue::Bool(true)));
        assert!(matches!(ArgValue::from(-3i64), ArgValue::Int(-3)));
        assert!(matches!(ArgValue::from(3u64), ArgValue::Uint(3)));
        assert!(matches!(ArgValue::from(0.5f64), ArgValue::Double(_)));
        assert!(matches!(ArgValue::from("s"), ArgValue::Str("s")));
        assert!(matches!(ArgValue::from(String::from("o")), ArgValue::CopyStr(_)));
        assert!(matches!(
            ArgValue::from(serde_json::json!({"k": 1})),
            ArgValue::Convertable(_)
        ));
    }

    #[rstest]
    fn finish_is_first_close_wins() {
        let mut event = TraceEvent {
            phase: TracePhase::Complete,
            category: "test",
            name: Cow::Borrowed("e"),
            scope: None,
            id: 0,
            bind_id: 0,
            tid: 1,
            timestamp_us: 100,
            thread_timestamp_us: None,
            duration_us: None,
            flags: 0,
            args: TraceArguments::none(),
        };
        event.finish(150);
        event.finish(900);
        assert_eq!(event.duration_us, Some(50));
    }

    #[rstest]
    fn finish_ignores_non_complete_phases() {
        let mut event = TraceEvent {
            phase: TracePhase::Instant,
            category: "test",
            name: Cow::Borrowed("e"),
            scope: None,
            id: 0,
            bind_id: 0,
            tid: 1,
            timestamp_us: 100,
            thread_timestamp_us: None,
            duration_us: None,
            flags: 0,
            args: TraceArguments::none(),
        };
        event.finish(150);
        assert_eq!(event.duration_us, None);
    }
}
