//! Central bounded event ring.
//!
//! Threads hand in full (or, at flush, partial) chunks; the ring stores
//! the events in arrival order, which preserves per-thread emission
//! order. Each ingested chunk's position is remembered by its sequence
//! number so a scope can still patch its begin event after the chunk
//! left the emitting thread. Positions are tracked as absolute indexes
//! (monotonic across evictions), so a handle simply goes stale once its
//! event falls off the front.

use crate::chunk::TraceChunk;
use crate::event::{EventHandle, TraceEvent};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordMode {
    /// Stop accepting events once the ring is full.
    RecordUntilFull,
    /// Evict the oldest events to admit new ones.
    RecordContinuously,
    /// RecordUntilFull with a 4x capacity ceiling.
    RecordAsMuchAsPossible,
}

pub(crate) const BIG_BUFFER_MULTIPLIER: usize = 4;

struct ChunkBase {
    seq: u32,
    base: u64,
    len: u32,
}

pub(crate) struct TraceBuffer {
    events: VecDeque<TraceEvent>,
    bases: VecDeque<ChunkBase>,
    /// Absolute index of `events.front()`.
    start: u64,
    /// Absolute index one past `events.back()`.
    next: u64,
    capacity: usize,
    mode: RecordMode,
    dropped: u64,
    full: bool,
}

impl TraceBuffer {
    pub(crate) fn new(capacity: usize, mode: RecordMode) -> Self {
        TraceBuffer {
            events: VecDeque::new(),
            bases: VecDeque::new(),
            start: 0,
            next: 0,
            capacity,
            mode,
            dropped: 0,
            full: false,
        }
    }

    pub(crate) fn reset(&mut self, capacity: usize, mode: RecordMode) {
        self.events.clear();
        self.bases.clear();
        self.start = self.next;
        self.capacity = capacity;
        self.mode = mode;
        self.dropped = 0;
        self.full = false;
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.dropped
    }

    pub(crate) fn is_full(&self) -> bool {
        self.full
    }

    pub(crate) fn len(&self) -> usize {
        self.events.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &TraceEvent> {
        self.events.iter()
    }

    /// Moves a chunk's events into the ring. Returns whether the ring is
    /// full for the stop-when-full modes.
    pub(crate) fn ingest(&mut self, chunk: TraceChunk) -> bool {
        let seq = chunk.seq();
        let mut incoming = chunk.take_events();
        if incoming.is_empty() {
            return self.full;
        }
        match self.mode {
            RecordMode::RecordUntilFull | RecordMode::RecordAsMuchAsPossible => {
                let room = self.capacity.saturating_sub(self.events.len());
                if incoming.len() > room {
                    self.dropped += (incoming.len() - room) as u64;
                    self.full = true;
                    tracing::debug!(
                        chunk_seq = seq,
                        dropped = self.dropped,
                        "trace buffer full, dropping events"
                    );
                    incoming.truncate(room);
                }
                if incoming.is_empty() {
                    return self.full;
                }
                self.push_chunk(seq, incoming);
            }
            RecordMode::RecordContinuously => {
                self.push_chunk(seq, incoming);
                while self.events.len() > self.capacity {
                    self.events.pop_front();
                    self.start += 1;
                }
                while self
                    .bases
                    .front()
                    .is_some_and(|b| b.base + b.len as u64 <= self.start)
                {
                    self.bases.pop_front();
                }
            }
        }
        self.full
    }

    fn push_chunk(&mut self, seq: u32, incoming: Vec<TraceEvent>) {
        self.bases.push_back(ChunkBase {
            seq,
            base: self.next,
            len: incoming.len() as u32,
        });
        self.next += incoming.len() as u64;
        self.events.extend(incoming);
    }

    /// Patches the duration of a complete event if its chunk is still
    /// resident. Silently does nothing for stale handles.
    pub(crate) fn patch_duration(&mut self, handle: EventHandle, end_timestamp_us: i64) {
        let Some(base) = self.bases.iter().find(|b| b.seq == handle.chunk_seq) else {
            return;
        };
        if handle.event_index as u32 >= base.len {
            return;
        }
        let abs = base.base + handle.event_index as u64;
        if abs < self.start {
            return;
        }
        if let Some(event) = self.events.get_mut((abs - self.start) as usize) {
            event.finish(end_timestamp_us);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.events.clear();
        self.bases.clear();
        self.start = self.next;
        self.dropped = 0;
        self.full = false;
    }
}
