//! Fixed-capacity event chunk, the unit handed between a thread and the
//! central ring. Appends are plain pushes; no atomics are involved while
//! a thread owns its chunk.

use crate::event::TraceEvent;

pub(crate) struct TraceChunk {
    seq: u32,
    capacity: usize,
    events: Vec<TraceEvent>,
}

impl TraceChunk {
    pub(crate) fn new(seq: u32, capacity: usize) -> Self {
        TraceChunk {
            seq,
            capacity,
            events: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub(crate) fn seq(&self) -> u32 {
        self.seq
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.events.len() >= self.capacity
    }

    /// Appends an event and returns its index within the chunk.
    #[inline]
    pub(crate) fn push(&mut self, event: TraceEvent) -> u16 {
        debug_assert!(!self.is_full());
        let index = self.events.len() as u16;
        self.events.push(event);
        index
    }

    pub(crate) fn patch_duration(&mut self, event_index: u16, end_timestamp_us: i64) {
        if let Some(event) = self.events.get_mut(event_index as usize) {
            event.finish(end_timestamp_us);
        }
    }

    pub(crate) fn take_events(self) -> Vec<TraceEvent> {
        self.events
    }
}
