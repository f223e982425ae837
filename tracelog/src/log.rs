//! The recording engine: session control, the emit path, and flush.
//!
//! One `TraceLog` owns the category registry, the central event ring,
//! and the per-thread chunk slots. Production code uses the process-wide
//! [`TraceLog::instance`]; tests construct private engines with
//! [`TraceLog::with_config`] so sessions cannot interfere across tests.
//!
//! Lock order, where multiple locks are held: `session` before
//! `threads` before `pending` before a thread's `chunk` slot, and
//! `buffer` before `pending`; `buffer` is otherwise taken alone or via
//! `try_lock`. The `callback` slot is only ever taken after `session`
//! or alone, and never across the callback invocation.

use crate::buffer::{RecordMode, TraceBuffer, BIG_BUFFER_MULTIPLIER};
use crate::category::{
    CategoryGroup, CategoryRegistry, ENABLED_FOR_EVENT_CALLBACK, ENABLED_FOR_RECORDING,
};
use crate::chunk::TraceChunk;
use crate::clock;
use crate::common::unlikely;
use crate::config::TraceConfig;
use crate::error::TraceError;
use crate::event::{
    EventHandle, TraceArguments, TraceEvent, TraceId, TracePhase, TRACE_EVENT_FLAG_COPY,
    TRACE_EVENT_FLAG_EXPLICIT_TIMESTAMP, TRACE_EVENT_FLAG_FLOW_IN, TRACE_EVENT_FLAG_FLOW_OUT,
    TRACE_EVENT_FLAG_MANGLE_ID, TRACE_EVENT_FLAG_NONE,
};
use crate::filter::CategoryFilter;
use crate::scope::ScopedTracer;
use crate::serializer;
use crate::thread_buffer::{self, PendingChunks, ThreadShared};
use crossbeam::utils::CachePadded;
use parking_lot::Mutex;
use std::borrow::Cow;
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use trace_format::TraceArrayWriter;

/// Called for every event on a category the callback filter matches,
/// before the event is (possibly) recorded.
pub type EventCallback = Box<dyn Fn(&TraceEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Disabled,
    Enabled,
    Disabling,
}

struct SessionState {
    status: SessionStatus,
    filter: Option<CategoryFilter>,
    mode: RecordMode,
}

struct CallbackEntry {
    callback: EventCallback,
    filter: CategoryFilter,
}

static NEXT_LOG_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    // Set while the event callback runs; emits from inside it are dropped.
    static IN_CALLBACK: Cell<bool> = const { Cell::new(false) };
}

pub struct TraceLog {
    id: u64,
    process_id: u32,
    config: TraceConfig,
    registry: CategoryRegistry,
    session: Mutex<SessionState>,
    threads: Mutex<Vec<Arc<ThreadShared>>>,
    buffer: Mutex<TraceBuffer>,
    pending: Arc<PendingChunks>,
    callback: Mutex<Option<Arc<CallbackEntry>>>,
    next_chunk_seq: AtomicU32,
    /// Set once the ring rejects events in the stop-when-full modes so
    /// the emit path can bail without touching any lock.
    buffer_full: AtomicBool,
    /// Events discarded on the fast path after `buffer_full` went up.
    dropped_early: CachePadded<AtomicU64>,
    num_sessions: AtomicU32,
}

impl TraceLog {
    pub fn new() -> Self {
        Self::with_config(TraceConfig::default())
    }

    pub fn with_config(config: TraceConfig) -> Self {
        let capacity = config.buffer_chunks * config.chunk_events;
        TraceLog {
            id: NEXT_LOG_ID.fetch_add(1, Ordering::Relaxed),
            process_id: std::process::id(),
            config,
            registry: CategoryRegistry::new(),
            session: Mutex::new(SessionState {
                status: SessionStatus::Disabled,
                filter: None,
                mode: RecordMode::RecordUntilFull,
            }),
            threads: Mutex::new(Vec::new()),
            buffer: Mutex::new(TraceBuffer::new(capacity, RecordMode::RecordUntilFull)),
            pending: Arc::new(Mutex::new(Vec::new())),
            callback: Mutex::new(None),
            next_chunk_seq: AtomicU32::new(1),
            buffer_full: AtomicBool::new(false),
            dropped_early: CachePadded::new(AtomicU64::new(0)),
            num_sessions: AtomicU32::new(0),
        }
    }

    /// The process-wide engine. The first touch reads
    /// `TRACE_BUFFER_CHUNKS`, `TRACE_CHUNK_EVENTS`, and
    /// `TRACE_STARTUP_FILTER` from the environment; a startup filter
    /// starts a RecordUntilFull session immediately.
    pub fn instance() -> &'static TraceLog {
        static INSTANCE: OnceLock<TraceLog> = OnceLock::new();
        INSTANCE.get_or_init(|| {
            let config = TraceConfig::from_env();
            let log = TraceLog::with_config(config);
            if let Some(filter) = log.config.startup_filter.clone() {
                if let Err(error) = log.enable(&filter, RecordMode::RecordUntilFull) {
                    tracing::warn!(%error, filter, "startup trace filter rejected");
                }
            }
            log
        })
    }

    // -- session control -------------------------------------------------

    /// Starts a recording session.
    ///
    /// Re-enabling with the identical filter and mode is a no-op; a
    /// different configuration fails with `AlreadyEnabled` and leaves
    /// the running session untouched.
    pub fn enable(&self, filter: &str, mode: RecordMode) -> Result<(), TraceError> {
        let parsed = CategoryFilter::parse(filter)?;
        let mut session = self.session.lock();
        if session.status == SessionStatus::Enabled {
            if session.filter.as_ref() == Some(&parsed) && session.mode == mode {
                return Ok(());
            }
            return Err(TraceError::AlreadyEnabled);
        }

        // Drop anything a previous session left in thread slots or the
        // pending queue; the ring starts the session empty.
        for shared in self.threads.lock().iter() {
            shared.chunk.lock().take();
        }
        let capacity = self.config.buffer_chunks
            * self.config.chunk_events
            * if mode == RecordMode::RecordAsMuchAsPossible {
                BIG_BUFFER_MULTIPLIER
            } else {
                1
            };
        self.buffer.lock().reset(capacity, mode);
        self.pending.lock().clear();
        self.buffer_full.store(false, Ordering::Relaxed);
        self.dropped_early.store(0, Ordering::Relaxed);

        session.status = SessionStatus::Enabled;
        session.filter = Some(parsed);
        session.mode = mode;
        self.num_sessions.fetch_add(1, Ordering::Relaxed);
        self.refresh_category_bytes(&session);
        tracing::debug!(filter, ?mode, "tracing enabled");
        Ok(())
    }

    /// Stops recording. Buffered events stay available until a flush in
    /// the disabled state drains them.
    pub fn disable(&self) {
        let mut session = self.session.lock();
        if session.status == SessionStatus::Disabled {
            return;
        }
        session.status = SessionStatus::Disabling;
        self.refresh_category_bytes(&session);
        // Pull thread-resident chunks in so a later flush sees them even
        // if the owning threads never emit again.
        {
            let threads = self.threads.lock();
            let mut pending = self.pending.lock();
            for shared in threads.iter() {
                if let Some(chunk) = shared.chunk.lock().take() {
                    pending.push(chunk);
                }
            }
        }
        session.status = SessionStatus::Disabled;
        tracing::debug!("tracing disabled");
    }

    pub fn is_enabled(&self) -> bool {
        self.session.lock().status == SessionStatus::Enabled
    }

    /// Number of sessions ever started on this engine.
    pub fn num_sessions(&self) -> u32 {
        self.num_sessions.load(Ordering::Relaxed)
    }

    // -- categories ------------------------------------------------------

    /// Resolves a category group string to its stable registry record.
    pub fn category_group(&self, name: &'static str) -> &CategoryGroup {
        self.registry
            .get_or_insert(name, |group| self.enable_bits_for(group))
    }

    /// The enable byte for a category group, for call-site caches.
    pub fn category_group_enabled(&self, name: &'static str) -> &AtomicU8 {
        self.category_group(name).enabled_byte()
    }

    fn enable_bits_for(&self, group: &str) -> u8 {
        let mut bits = 0;
        {
            let session = self.session.lock();
            if session.status == SessionStatus::Enabled {
                if let Some(filter) = &session.filter {
                    if filter.is_group_enabled(group) {
                        bits |= ENABLED_FOR_RECORDING;
                    }
                }
            }
        }
        if let Some(entry) = self.callback.lock().as_ref() {
            if entry.filter.is_group_enabled(group) {
                bits |= ENABLED_FOR_EVENT_CALLBACK;
            }
        }
        bits
    }

    /// Recomputes every published enable byte. Called with the session
    /// lock held so emitters observe filter changes atomically per byte.
    fn refresh_category_bytes(&self, session: &SessionState) {
        let callback = self.callback.lock();
        let recording = session.status == SessionStatus::Enabled;
        for group in self.registry.iter() {
            if CategoryRegistry::is_reserved(group.name()) {
                group.enabled_byte().store(0, Ordering::Relaxed);
                continue;
            }
            let mut bits = 0;
            if recording {
                if let Some(filter) = &session.filter {
                    if filter.is_group_enabled(group.name()) {
                        bits |= ENABLED_FOR_RECORDING;
                    }
                }
            }
            if let Some(entry) = callback.as_ref() {
                if entry.filter.is_group_enabled(group.name()) {
                    bits |= ENABLED_FOR_EVENT_CALLBACK;
                }
            }
            group.enabled_byte().store(bits, Ordering::Relaxed);
        }
    }

    // -- event callback --------------------------------------------------

    /// Installs the event callback for categories matching `filter`.
    /// Replaces any previous callback.
    pub fn set_event_callback(
        &self,
        filter: &str,
        callback: EventCallback,
    ) -> Result<(), TraceError> {
        let parsed = CategoryFilter::parse(filter)?;
        *self.callback.lock() = Some(Arc::new(CallbackEntry {
            callback,
            filter: parsed,
        }));
        let session = self.session.lock();
        self.refresh_category_bytes(&session);
        Ok(())
    }

    pub fn clear_event_callback(&self) {
        *self.callback.lock() = None;
        let session = self.session.lock();
        self.refresh_category_bytes(&session);
    }

    fn invoke_event_callback(&self, event: &TraceEvent) {
        // Clone the entry out of the slot so a callback may replace or
        // clear itself without deadlocking.
        let entry = self.callback.lock().clone();
        if let Some(entry) = entry {
            IN_CALLBACK.with(|flag| {
                flag.set(true);
                (entry.callback)(event);
                flag.set(false);
            });
        }
    }

    // -- emit path -------------------------------------------------------

    /// Records one event. Returns a handle usable for duration patching
    /// when the event was stored, `None` when it was filtered, dropped,
    /// or only forwarded to the callback.
    pub fn add_trace_event(
        &self,
        phase: TracePhase,
        category: &CategoryGroup,
        name: impl Into<Cow<'static, str>>,
        id: TraceId,
        bind_id: u64,
        flags: u16,
        args: TraceArguments,
    ) -> Option<EventHandle> {
        self.add_trace_event_inner(phase, category, name, id, bind_id, flags, None, args)
    }

    /// Records one event with a caller-supplied timestamp instead of
    /// reading the clock, for events translated from another time
    /// source. The event carries `TRACE_EVENT_FLAG_EXPLICIT_TIMESTAMP`
    /// and no thread timestamp.
    #[allow(clippy::too_many_arguments)]
    pub fn add_trace_event_with_timestamp(
        &self,
        phase: TracePhase,
        category: &CategoryGroup,
        name: impl Into<Cow<'static, str>>,
        id: TraceId,
        bind_id: u64,
        flags: u16,
        timestamp_us: i64,
        args: TraceArguments,
    ) -> Option<EventHandle> {
        self.add_trace_event_inner(
            phase,
            category,
            name,
            id,
            bind_id,
            flags | TRACE_EVENT_FLAG_EXPLICIT_TIMESTAMP,
            Some(timestamp_us),
            args,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn add_trace_event_inner(
        &self,
        phase: TracePhase,
        category: &CategoryGroup,
        name: impl Into<Cow<'static, str>>,
        id: TraceId,
        bind_id: u64,
        flags: u16,
        explicit_timestamp_us: Option<i64>,
        args: TraceArguments,
    ) -> Option<EventHandle> {
        let state = category.state();
        if state == 0 {
            return None;
        }
        if unlikely(IN_CALLBACK.with(|flag| flag.get())) {
            return None;
        }

        let (raw_id, scope, id_flags) = id.resolve();
        let mut flags = flags | id_flags;
        let mut raw_id = raw_id;
        if flags & TRACE_EVENT_FLAG_MANGLE_ID != 0 {
            raw_id ^= self.process_id as u64;
        }
        let mut name = name.into();
        if flags & TRACE_EVENT_FLAG_COPY != 0 {
            if let Cow::Borrowed(s) = name {
                name = Cow::Owned(s.to_string());
            }
            flags &= !TRACE_EVENT_FLAG_COPY;
        }
        let (timestamp_us, thread_timestamp_us) = match explicit_timestamp_us {
            Some(timestamp_us) => (timestamp_us, None),
            None => (clock::now_us(), Some(clock::thread_now_us())),
        };
        let event = TraceEvent {
            phase,
            category: category.name(),
            name,
            scope,
            id: raw_id,
            bind_id,
            tid: clock::current_thread_id(),
            timestamp_us,
            thread_timestamp_us,
            duration_us: None,
            flags,
            args,
        };

        if unlikely(state & ENABLED_FOR_EVENT_CALLBACK != 0) {
            self.invoke_event_callback(&event);
        }
        if state & ENABLED_FOR_RECORDING == 0 {
            return None;
        }
        self.append_event(event)
    }

    fn append_event(&self, event: TraceEvent) -> Option<EventHandle> {
        if unlikely(self.buffer_full.load(Ordering::Relaxed)) {
            self.dropped_early.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        let tid = event.tid;
        thread_buffer::with_thread_shared(
            self.id,
            tid,
            &self.pending,
            |shared| self.threads.lock().push(shared),
            |shared| {
                let mut slot = shared.chunk.lock();
                let chunk = slot.get_or_insert_with(|| {
                    TraceChunk::new(
                        self.next_chunk_seq.fetch_add(1, Ordering::Relaxed),
                        self.config.chunk_events,
                    )
                });
                let index = chunk.push(event);
                let handle = EventHandle {
                    chunk_seq: chunk.seq(),
                    event_index: index,
                };
                if chunk.is_full() {
                    let full = slot.take();
                    drop(slot);
                    if let Some(full) = full {
                        self.release_chunk(full);
                    }
                }
                Some(handle)
            },
        )
    }

    fn release_chunk(&self, chunk: TraceChunk) {
        self.pending.lock().push(chunk);
        // Opportunistic ingest; if the ring is busy (a flush is
        // running), the chunk just waits in the queue.
        if let Some(mut buffer) = self.buffer.try_lock() {
            self.ingest_pending(&mut buffer);
        }
    }

    fn ingest_pending(&self, buffer: &mut TraceBuffer) {
        let chunks = std::mem::take(&mut *self.pending.lock());
        for chunk in chunks {
            if buffer.ingest(chunk) {
                self.buffer_full.store(true, Ordering::Relaxed);
            }
        }
    }

    /// Closes a complete event identified by `handle`, writing its
    /// duration. Stale handles (chunk recycled, or the ring busy with a
    /// flush) are silently ignored.
    pub fn update_event_duration(&self, handle: EventHandle) {
        let end_timestamp_us = clock::now_us();
        // Fast path: the event is usually still in the current thread's
        // open chunk.
        let patched = thread_buffer::with_thread_shared(
            self.id,
            clock::current_thread_id(),
            &self.pending,
            |shared| self.threads.lock().push(shared),
            |shared| {
                let mut slot = shared.chunk.lock();
                if let Some(chunk) = slot.as_mut() {
                    if chunk.seq() == handle.chunk_seq {
                        chunk.patch_duration(handle.event_index, end_timestamp_us);
                        return true;
                    }
                }
                false
            },
        );
        if patched {
            return;
        }
        // The scope may have migrated threads; its begin event can still
        // be in another thread's open chunk.
        {
            let threads = self.threads.lock();
            for shared in threads.iter() {
                let mut slot = shared.chunk.lock();
                if let Some(chunk) = slot.as_mut() {
                    if chunk.seq() == handle.chunk_seq {
                        chunk.patch_duration(handle.event_index, end_timestamp_us);
                        return;
                    }
                }
            }
        }
        if let Some(mut buffer) = self.buffer.try_lock() {
            self.ingest_pending(&mut buffer);
            buffer.patch_duration(handle, end_timestamp_us);
        }
    }

    // -- flush -----------------------------------------------------------

    /// Serialises the recorded events as a Chrome trace JSON array into
    /// `sink`.
    ///
    /// Events are ordered by timestamp with thread id as the tie-break;
    /// ties beyond that keep emission order. While a session is enabled
    /// the buffer is left intact; in the disabled state a successful
    /// flush drains it. A sink error aborts the flush and keeps the
    /// buffer for a retry.
    pub fn flush<F>(&self, sink: F) -> Result<(), TraceError>
    where
        F: FnMut(&[u8]) -> std::io::Result<()>,
    {
        let draining = self.session.lock().status == SessionStatus::Disabled;

        // Steal partial chunks so the flush sees every event emitted
        // before it started. Emitting threads just open a fresh chunk.
        {
            let threads = self.threads.lock();
            let mut pending = self.pending.lock();
            for shared in threads.iter() {
                if let Some(chunk) = shared.chunk.lock().take() {
                    tracing::trace!(tid = shared.tid, "stealing partial chunk for flush");
                    pending.push(chunk);
                }
            }
        }
        // Entries for exited threads have served their purpose once
        // their residual chunk is collected.
        self.threads
            .lock()
            .retain(|shared| Arc::strong_count(shared) > 1);

        let mut buffer = self.buffer.lock();
        self.ingest_pending(&mut buffer);

        let mut writer = TraceArrayWriter::new(sink);
        let mut json = String::with_capacity(256);
        let dropped = buffer.dropped() + self.dropped_early.load(Ordering::Relaxed);
        if dropped > 0 {
            serializer::append_overflow_metadata(
                self.process_id,
                clock::current_thread_id(),
                clock::now_us(),
                dropped,
                &mut json,
            );
            writer
                .write_serialized(&json)
                .map_err(TraceError::BufferExhausted)?;
        }
        {
            let mut ordered: Vec<&TraceEvent> = buffer.iter().collect();
            ordered.sort_by(|a, b| {
                a.timestamp_us
                    .cmp(&b.timestamp_us)
                    .then_with(|| a.tid.cmp(&b.tid))
            });
            tracing::trace!(
                events = buffer.len(),
                full = buffer.is_full(),
                dropped,
                "flushing trace buffer"
            );
            for event in ordered {
                json.clear();
                serializer::append_event_as_json(event, self.process_id, &mut json);
                writer
                    .write_serialized(&json)
                    .map_err(TraceError::BufferExhausted)?;
            }
        }
        writer.finish().map_err(TraceError::BufferExhausted)?;

        if draining {
            buffer.clear();
            self.dropped_early.store(0, Ordering::Relaxed);
            self.buffer_full.store(false, Ordering::Relaxed);
        }
        Ok(())
    }

    // -- convenience emitters --------------------------------------------

    pub fn instant(&self, category: &'static str, name: impl Into<Cow<'static, str>>, args: TraceArguments) {
        let group = self.category_group(category);
        self.add_trace_event(
            TracePhase::Instant,
            group,
            name,
            TraceId::None,
            0,
            TRACE_EVENT_FLAG_NONE,
            args,
        );
    }

    /// An instant event stamped with `timestamp_us` from the caller's
    /// time source instead of the monotonic clock.
    pub fn instant_with_timestamp(
        &self,
        category: &'static str,
        name: impl Into<Cow<'static, str>>,
        timestamp_us: i64,
        args: TraceArguments,
    ) {
        let group = self.category_group(category);
        self.add_trace_event_with_timestamp(
            TracePhase::Instant,
            group,
            name,
            TraceId::None,
            0,
            TRACE_EVENT_FLAG_NONE,
            timestamp_us,
            args,
        );
    }

    pub fn begin(&self, category: &'static str, name: impl Into<Cow<'static, str>>, args: TraceArguments) {
        let group = self.category_group(category);
        self.add_trace_event(
            TracePhase::Begin,
            group,
            name,
            TraceId::None,
            0,
            TRACE_EVENT_FLAG_NONE,
            args,
        );
    }

    pub fn end(&self, category: &'static str, name: impl Into<Cow<'static, str>>) {
        let group = self.category_group(category);
        self.add_trace_event(
            TracePhase::End,
            group,
            name,
            TraceId::None,
            0,
            TRACE_EVENT_FLAG_NONE,
            TraceArguments::none(),
        );
    }

    /// Opens a complete event; dropping the returned tracer closes it.
    pub fn scoped(
        &self,
        category: &'static str,
        name: impl Into<Cow<'static, str>>,
        args: TraceArguments,
    ) -> ScopedTracer<'_> {
        ScopedTracer::begin(self, self.category_group(category), name, None, args)
    }

    /// [`scoped`](Self::scoped) for a call site that has already
    /// resolved the category record.
    pub fn scoped_for(
        &self,
        category: &CategoryGroup,
        name: impl Into<Cow<'static, str>>,
        args: TraceArguments,
    ) -> ScopedTracer<'_> {
        ScopedTracer::begin(self, category, name, None, args)
    }

    /// A scoped complete event that also participates in a flow.
    pub fn scoped_with_flow(
        &self,
        category: &'static str,
        name: impl Into<Cow<'static, str>>,
        bind_id: u64,
        flags: u16,
        args: TraceArguments,
    ) -> ScopedTracer<'_> {
        ScopedTracer::begin(
            self,
            self.category_group(category),
            name,
            Some((bind_id, flags & (TRACE_EVENT_FLAG_FLOW_IN | TRACE_EVENT_FLAG_FLOW_OUT))),
            args,
        )
    }

    pub fn async_begin(&self, category: &'static str, name: impl Into<Cow<'static, str>>, id: TraceId, args: TraceArguments) {
        let group = self.category_group(category);
        self.add_trace_event(
            TracePhase::AsyncBegin,
            group,
            name,
            id,
            0,
            TRACE_EVENT_FLAG_NONE,
            args,
        );
    }

    pub fn async_begin_with_timestamp(
        &self,
        category: &'static str,
        name: impl Into<Cow<'static, str>>,
        id: TraceId,
        timestamp_us: i64,
        args: TraceArguments,
    ) {
        let group = self.category_group(category);
        self.add_trace_event_with_timestamp(
            TracePhase::AsyncBegin,
            group,
            name,
            id,
            0,
            TRACE_EVENT_FLAG_NONE,
            timestamp_us,
            args,
        );
    }

    pub fn async_step(&self, category: &'static str, name: impl Into<Cow<'static, str>>, id: TraceId, args: TraceArguments) {
        let group = self.category_group(category);
        self.add_trace_event(
            TracePhase::AsyncStep,
            group,
            name,
            id,
            0,
            TRACE_EVENT_FLAG_NONE,
            args,
        );
    }

    pub fn async_end(&self, category: &'static str, name: impl Into<Cow<'static, str>>, id: TraceId, args: TraceArguments) {
        let group = self.category_group(category);
        self.add_trace_event(
            TracePhase::AsyncEnd,
            group,
            name,
            id,
            0,
            TRACE_EVENT_FLAG_NONE,
            args,
        );
    }

    pub fn async_end_with_timestamp(
        &self,
        category: &'static str,
        name: impl Into<Cow<'static, str>>,
        id: TraceId,
        timestamp_us: i64,
        args: TraceArguments,
    ) {
        let group = self.category_group(category);
        self.add_trace_event_with_timestamp(
            TracePhase::AsyncEnd,
            group,
            name,
            id,
            0,
            TRACE_EVENT_FLAG_NONE,
            timestamp_us,
            args,
        );
    }

    pub fn flow_begin(&self, category: &'static str, name: impl Into<Cow<'static, str>>, flow_id: u64, args: TraceArguments) {
        let group = self.category_group(category);
        self.add_trace_event(
            TracePhase::FlowBegin,
            group,
            name,
            TraceId::Raw(flow_id),
            0,
            TRACE_EVENT_FLAG_NONE,
            args,
        );
    }

    pub fn flow_step(&self, category: &'static str, name: impl Into<Cow<'static, str>>, flow_id: u64, args: TraceArguments) {
        let group = self.category_group(category);
        self.add_trace_event(
            TracePhase::FlowStep,
            group,
            name,
            TraceId::Raw(flow_id),
            0,
            TRACE_EVENT_FLAG_NONE,
            args,
        );
    }

    pub fn flow_end(&self, category: &'static str, name: impl Into<Cow<'static, str>>, flow_id: u64, args: TraceArguments) {
        let group = self.category_group(category);
        self.add_trace_event(
            TracePhase::FlowEnd,
            group,
            name,
            TraceId::Raw(flow_id),
            0,
            TRACE_EVENT_FLAG_NONE,
            args,
        );
    }

    pub fn object_created(&self, category: &'static str, name: &'static str, id: TraceId) {
        let group = self.category_group(category);
        self.add_trace_event(
            TracePhase::ObjectCreated,
            group,
            name,
            id,
            0,
            TRACE_EVENT_FLAG_NONE,
            TraceArguments::none(),
        );
    }

    /// Snapshots are wrapped in a `snapshot` argument, the shape the
    /// trace viewer's object inspector expects.
    pub fn object_snapshot(
        &self,
        category: &'static str,
        name: &'static str,
        id: TraceId,
        snapshot: impl Into<crate::event::ArgValue>,
    ) {
        let group = self.category_group(category);
        self.add_trace_event(
            TracePhase::ObjectSnapshot,
            group,
            name,
            id,
            0,
            TRACE_EVENT_FLAG_NONE,
            TraceArguments::one("snapshot", snapshot),
        );
    }

    pub fn object_deleted(&self, category: &'static str, name: &'static str, id: TraceId) {
        let group = self.category_group(category);
        self.add_trace_event(
            TracePhase::ObjectDeleted,
            group,
            name,
            id,
            0,
            TRACE_EVENT_FLAG_NONE,
            TraceArguments::none(),
        );
    }

    pub fn counter(&self, category: &'static str, name: impl Into<Cow<'static, str>>, value: i64) {
        let group = self.category_group(category);
        self.add_trace_event(
            TracePhase::Counter,
            group,
            name,
            TraceId::None,
            0,
            TRACE_EVENT_FLAG_NONE,
            TraceArguments::one("value", value),
        );
    }

    pub fn metadata(&self, category: &'static str, name: impl Into<Cow<'static, str>>, args: TraceArguments) {
        let group = self.category_group(category);
        self.add_trace_event(
            TracePhase::Metadata,
            group,
            name,
            TraceId::None,
            0,
            TRACE_EVENT_FLAG_NONE,
            args,
        );
    }
}

impl Default for TraceLog {
    fn default() -> Self {
        TraceLog::new()
    }
}
