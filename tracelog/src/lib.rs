//! In-process trace-event recording in the Chrome Trace Event Format.
//!
//! Instrumented code names a category group and emits events; a session
//! controller turns categories on and off with a filter string; events
//! accumulate in per-thread chunks that drain into a bounded central
//! ring; a flush serialises everything as a JSON array Chrome's trace
//! viewer and Perfetto can load.
//!
//! ## Quick start
//!
//! ```no_run
//! use tracelog::{trace_event_instant, trace_event_scoped, RecordMode};
//!
//! tracelog::enable("gpu,cc,-disabled-by-default-*", RecordMode::RecordContinuously)?;
//!
//! trace_event_instant!("gpu", "vsync");
//! {
//!     let _span = trace_event_scoped!("cc", "raster", "tiles" => 12i64);
//!     // ... work ...
//! }
//!
//! tracelog::disable();
//! let mut out = Vec::new();
//! tracelog::flush(|bytes| {
//!     out.extend_from_slice(bytes);
//!     Ok(())
//! })?;
//! # Ok::<(), tracelog::TraceError>(())
//! ```
//!
//! ## Cost model
//!
//! Disabled categories cost one relaxed byte load per event (plus one
//! pointer load at macro call sites); arguments are not evaluated.
//! Enabled events append to a thread-owned chunk without touching
//! shared state until the chunk fills.

mod buffer;
mod category;
mod chunk;
mod clock;
mod common;
mod config;
mod error;
mod event;
mod filter;
mod log;
mod macros;
mod sampling;
mod scope;
mod serializer;
mod thread_buffer;

pub use buffer::RecordMode;
pub use category::{
    CategoryGroup, DISABLED_BY_DEFAULT_PREFIX, ENABLED_FOR_EVENT_CALLBACK, ENABLED_FOR_RECORDING,
    MAX_CATEGORY_GROUPS,
};
pub use clock::{current_thread_id, now_us, thread_now_us};
pub use config::{TraceConfig, ENV_BUFFER_CHUNKS, ENV_CHUNK_EVENTS, ENV_STARTUP_FILTER};
pub use error::TraceError;
pub use event::{
    ArgValue, ConvertableToTraceFormat, EventHandle, TraceArguments, TraceEvent, TraceId,
    TracePhase, TRACE_EVENT_FLAG_COPY, TRACE_EVENT_FLAG_EXPLICIT_TIMESTAMP,
    TRACE_EVENT_FLAG_FLOW_IN, TRACE_EVENT_FLAG_FLOW_OUT, TRACE_EVENT_FLAG_HAS_ID,
    TRACE_EVENT_FLAG_MANGLE_ID, TRACE_EVENT_FLAG_NONE,
};
pub use filter::CategoryFilter;
pub use log::{EventCallback, SessionStatus, TraceLog};
pub use sampling::{
    clear_sampling_state, current_sampling_state, set_sampling_state, SamplingState,
    ScopedSamplingState, SAMPLING_BUCKETS,
};
pub use scope::{ScopedTracer, ScopedTrackableObject};

use std::borrow::Cow;

/// Starts a session on the global engine. See [`TraceLog::enable`].
pub fn enable(filter: &str, mode: RecordMode) -> Result<(), TraceError> {
    TraceLog::instance().enable(filter, mode)
}

/// Stops the global session. See [`TraceLog::disable`].
pub fn disable() {
    TraceLog::instance().disable()
}

pub fn is_enabled() -> bool {
    TraceLog::instance().is_enabled()
}

pub fn num_sessions() -> u32 {
    TraceLog::instance().num_sessions()
}

/// Serialises the global engine's buffer. See [`TraceLog::flush`].
pub fn flush<F>(sink: F) -> Result<(), TraceError>
where
    F: FnMut(&[u8]) -> std::io::Result<()>,
{
    TraceLog::instance().flush(sink)
}

pub fn set_event_callback(filter: &str, callback: EventCallback) -> Result<(), TraceError> {
    TraceLog::instance().set_event_callback(filter, callback)
}

pub fn clear_event_callback() {
    TraceLog::instance().clear_event_callback()
}

pub fn event_instant(category: &'static str, name: impl Into<Cow<'static, str>>, args: TraceArguments) {
    TraceLog::instance().instant(category, name, args)
}

/// An instant event with a caller-supplied timestamp. See
/// [`TraceLog::instant_with_timestamp`].
pub fn event_instant_with_timestamp(
    category: &'static str,
    name: impl Into<Cow<'static, str>>,
    timestamp_us: i64,
    args: TraceArguments,
) {
    TraceLog::instance().instant_with_timestamp(category, name, timestamp_us, args)
}

pub fn event_begin(category: &'static str, name: impl Into<Cow<'static, str>>, args: TraceArguments) {
    TraceLog::instance().begin(category, name, args)
}

pub fn event_end(category: &'static str, name: impl Into<Cow<'static, str>>) {
    TraceLog::instance().end(category, name)
}

/// Opens a scoped complete event on the global engine.
pub fn event_scoped(
    category: &'static str,
    name: impl Into<Cow<'static, str>>,
    args: TraceArguments,
) -> ScopedTracer<'static> {
    TraceLog::instance().scoped(category, name, args)
}

pub fn event_async_begin(category: &'static str, name: impl Into<Cow<'static, str>>, id: TraceId, args: TraceArguments) {
    TraceLog::instance().async_begin(category, name, id, args)
}

pub fn event_async_begin_with_timestamp(
    category: &'static str,
    name: impl Into<Cow<'static, str>>,
    id: TraceId,
    timestamp_us: i64,
    args: TraceArguments,
) {
    TraceLog::instance().async_begin_with_timestamp(category, name, id, timestamp_us, args)
}

pub fn event_async_step(category: &'static str, name: impl Into<Cow<'static, str>>, id: TraceId, args: TraceArguments) {
    TraceLog::instance().async_step(category, name, id, args)
}

pub fn event_async_end(category: &'static str, name: impl Into<Cow<'static, str>>, id: TraceId, args: TraceArguments) {
    TraceLog::instance().async_end(category, name, id, args)
}

pub fn event_async_end_with_timestamp(
    category: &'static str,
    name: impl Into<Cow<'static, str>>,
    id: TraceId,
    timestamp_us: i64,
    args: TraceArguments,
) {
    TraceLog::instance().async_end_with_timestamp(category, name, id, timestamp_us, args)
}

pub fn event_flow_begin(category: &'static str, name: impl Into<Cow<'static, str>>, flow_id: u64, args: TraceArguments) {
    TraceLog::instance().flow_begin(category, name, flow_id, args)
}

pub fn event_flow_step(category: &'static str, name: impl Into<Cow<'static, str>>, flow_id: u64, args: TraceArguments) {
    TraceLog::instance().flow_step(category, name, flow_id, args)
}

pub fn event_flow_end(category: &'static str, name: impl Into<Cow<'static, str>>, flow_id: u64, args: TraceArguments) {
    TraceLog::instance().flow_end(category, name, flow_id, args)
}

pub fn event_object_created(category: &'static str, name: &'static str, id: TraceId) {
    TraceLog::instance().object_created(category, name, id)
}

pub fn event_object_snapshot(
    category: &'static str,
    name: &'static str,
    id: TraceId,
    snapshot: impl Into<ArgValue>,
) {
    TraceLog::instance().object_snapshot(category, name, id, snapshot)
}

pub fn event_object_deleted(category: &'static str, name: &'static str, id: TraceId) {
    TraceLog::instance().object_deleted(category, name, id)
}

pub fn event_counter(category: &'static str, name: impl Into<Cow<'static, str>>, value: i64) {
    TraceLog::instance().counter(category, name, value)
}

pub fn event_metadata(category: &'static str, name: impl Into<Cow<'static, str>>, args: TraceArguments) {
    TraceLog::instance().metadata(category, name, args)
}
