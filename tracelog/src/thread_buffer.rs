//! Per-thread buffering state.
//!
//! Each (engine, thread) pair owns at most one chunk at a time. The
//! chunk sits behind a mutex that the owning thread holds for a handful
//! of instructions per append; the flusher takes the same mutex to
//! steal partially filled chunks without stopping the thread. On thread
//! exit the TLS entry's drop hands any residual chunk back to the
//! engine's pending queue.

use crate::chunk::TraceChunk;
use parking_lot::Mutex;
use std::cell::RefCell;
use std::sync::{Arc, Weak};

pub(crate) type PendingChunks = Mutex<Vec<TraceChunk>>;

pub(crate) struct ThreadShared {
    pub(crate) tid: i32,
    pub(crate) chunk: Mutex<Option<TraceChunk>>,
    pending: Weak<PendingChunks>,
}

impl ThreadShared {
    pub(crate) fn new(tid: i32, pending: Weak<PendingChunks>) -> Self {
        ThreadShared {
            tid,
            chunk: Mutex::new(None),
            pending,
        }
    }

    pub(crate) fn engine_alive(&self) -> bool {
        self.pending.strong_count() > 0
    }
}

struct ThreadEntry {
    log_id: u64,
    shared: Arc<ThreadShared>,
}

impl Drop for ThreadEntry {
    fn drop(&mut self) {
        let chunk = self.shared.chunk.lock().take();
        if let Some(chunk) = chunk {
            if let Some(pending) = self.shared.pending.upgrade() {
                pending.lock().push(chunk);
            }
        }
    }
}

thread_local! {
    static THREAD_ENTRIES: RefCell<Vec<ThreadEntry>> = const { RefCell::new(Vec::new()) };
}

/// Runs `f` with this thread's shared slot for the given engine,
/// creating and registering the slot on first use. `register` is called
/// outside any TLS borrow conflict but inside the first-use path only.
pub(crate) fn with_thread_shared<R>(
    log_id: u64,
    tid: i32,
    pending: &Arc<PendingChunks>,
    register: impl FnOnce(Arc<ThreadShared>),
    f: impl FnOnce(&ThreadShared) -> R,
) -> R {
    THREAD_ENTRIES.with(|entries| {
        let mut entries = entries.borrow_mut();
        if let Some(entry) = entries.iter().find(|e| e.log_id == log_id) {
            return f(&entry.shared);
        }
        // First touch for this engine: drop entries of dead engines
        // while we are here, then register a fresh slot.
        entries.retain(|e| e.shared.engine_alive());
        let shared = Arc::new(ThreadShared::new(tid, Arc::downgrade(pending)));
        register(shared.clone());
        entries.push(ThreadEntry {
            log_id,
            shared: shared.clone(),
        });
        f(&shared)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{TraceArguments, TracePhase};
    use rstest::rstest;
    use std::borrow::Cow;

    fn chunk_with_one_event() -> TraceChunk {
        let mut chunk = TraceChunk::new(1, 4);
        chunk.push(crate::event::TraceEvent {
            phase: TracePhase::Instant,
            category: "test",
            name: Cow::Borrowed("residual"),
            scope: None,
            id: 0,
            bind_id: 0,
            tid: 7,
            timestamp_us: 1,
            thread_timestamp_us: None,
            duration_us: None,
            flags: 0,
            args: TraceArguments::none(),
        });
        chunk
    }

    #[rstest]
    fn thread_exit_returns_the_chunk_to_pending() {
        let pending: Arc<PendingChunks> = Arc::new(Mutex::new(Vec::new()));
        let pending_for_thread = pending.clone();
        std::thread::spawn(move || {
            with_thread_shared(
                u64::MAX,
                7,
                &pending_for_thread,
                |_| {},
                |shared| {
                    *shared.chunk.lock() = Some(chunk_with_one_event());
                },
            );
        })
        .join()
        .unwrap();
        assert_eq!(pending.lock().len(), 1);
    }

    #[rstest]
    fn dead_engine_residuals_are_dropped_quietly() {
        std::thread::spawn(|| {
            let pending: Arc<PendingChunks> = Arc::new(Mutex::new(Vec::new()));
            with_thread_shared(
                u64::MAX - 1,
                7,
                &pending,
                |_| {},
                |shared| {
                    *shared.chunk.lock() = Some(chunk_with_one_event());
                },
            );
            // The engine goes away before the thread does; the TLS
            // entry's drop must cope with the failed upgrade.
            drop(pending);
        })
        .join()
        .unwrap();
    }

    #[rstest]
    fn same_engine_reuses_the_slot() {
        let pending: Arc<PendingChunks> = Arc::new(Mutex::new(Vec::new()));
        let mut registrations = 0;
        for _ in 0..3 {
            with_thread_shared(u64::MAX - 2, 7, &pending, |_| registrations += 1, |_| {});
        }
        assert_eq!(registrations, 1);
    }
}
