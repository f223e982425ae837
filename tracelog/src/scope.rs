//! RAII tracers: complete-event scopes and trackable object lifetimes.

use crate::category::CategoryGroup;
use crate::event::{
    ArgValue, EventHandle, TraceArguments, TraceId, TracePhase, TRACE_EVENT_FLAG_NONE,
};
use crate::log::TraceLog;
use std::borrow::Cow;

/// Emits a complete (`X`) event on construction and patches its
/// duration on drop. Early returns, `?`, and panics all close the scope
/// through `Drop`; the patch is skipped silently when the begin event's
/// chunk has been recycled in the meantime.
#[must_use = "the scope closes when this tracer is dropped"]
pub struct ScopedTracer<'a> {
    log: &'a TraceLog,
    handle: Option<EventHandle>,
}

impl<'a> ScopedTracer<'a> {
    pub(crate) fn begin(
        log: &'a TraceLog,
        category: &CategoryGroup,
        name: impl Into<Cow<'static, str>>,
        flow: Option<(u64, u16)>,
        args: TraceArguments,
    ) -> Self {
        let (bind_id, flags) = flow.unwrap_or((0, TRACE_EVENT_FLAG_NONE));
        let handle = log.add_trace_event(
            TracePhase::Complete,
            category,
            name,
            TraceId::None,
            bind_id,
            flags,
            args,
        );
        ScopedTracer { log, handle }
    }

    /// A tracer that records nothing, for call sites whose category is
    /// disabled.
    pub fn inert(log: &'a TraceLog) -> Self {
        ScopedTracer { log, handle: None }
    }

    /// Whether the begin event was actually recorded.
    pub fn is_recording(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for ScopedTracer<'_> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.log.update_event_duration(handle);
        }
    }
}

/// Ties an object's trace lifetime to a Rust value: created on
/// construction, optional snapshots in between, deleted on drop.
pub struct ScopedTrackableObject<'a> {
    log: &'a TraceLog,
    category: &'static str,
    name: &'static str,
    id: TraceId,
}

impl<'a> ScopedTrackableObject<'a> {
    pub fn new(log: &'a TraceLog, category: &'static str, name: &'static str, id: TraceId) -> Self {
        log.object_created(category, name, id);
        ScopedTrackableObject {
            log,
            category,
            name,
            id,
        }
    }

    pub fn snapshot(&self, value: impl Into<ArgValue>) {
        self.log
            .object_snapshot(self.category, self.name, self.id, value);
    }
}

impl Drop for ScopedTrackableObject<'_> {
    fn drop(&mut self) {
        self.log.object_deleted(self.category, self.name, self.id);
    }
}
