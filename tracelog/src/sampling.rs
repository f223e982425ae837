//! Sampling-profiler state slots.
//!
//! A sampling profiler interrupting a thread cannot take locks or
//! allocate, so the "what is this thread doing" state lives in plain
//! atomic pointers to static descriptors. Three buckets are enough for
//! the conventional split (e.g. main thread, IO, compositor); callers
//! pick their own bucket assignment. There is no sampler here, only the
//! state the sampler would read.

use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

pub const SAMPLING_BUCKETS: usize = 3;

/// What a bucket's thread is currently doing. Must be `'static` so a
/// profiler can read it without coordination.
#[derive(Debug)]
pub struct SamplingState {
    pub category: &'static str,
    pub name: &'static str,
}

static BUCKETS: [AtomicPtr<SamplingState>; SAMPLING_BUCKETS] = [
    AtomicPtr::new(ptr::null_mut()),
    AtomicPtr::new(ptr::null_mut()),
    AtomicPtr::new(ptr::null_mut()),
];

fn bucket(index: usize) -> &'static AtomicPtr<SamplingState> {
    &BUCKETS[index % SAMPLING_BUCKETS]
}

pub fn set_sampling_state(index: usize, state: &'static SamplingState) {
    bucket(index).store(state as *const _ as *mut _, Ordering::Relaxed);
}

pub fn clear_sampling_state(index: usize) {
    bucket(index).store(ptr::null_mut(), Ordering::Relaxed);
}

pub fn current_sampling_state(index: usize) -> Option<&'static SamplingState> {
    let ptr = bucket(index).load(Ordering::Relaxed);
    unsafe { ptr.cast_const().as_ref() }
}

/// Swaps a bucket's state in for the current scope and restores the
/// previous value on drop, so nested annotated regions unwind cleanly.
pub struct ScopedSamplingState {
    index: usize,
    previous: *mut SamplingState,
}

impl ScopedSamplingState {
    pub fn new(index: usize, state: &'static SamplingState) -> Self {
        let previous = bucket(index).swap(state as *const _ as *mut _, Ordering::Relaxed);
        ScopedSamplingState { index, previous }
    }
}

impl Drop for ScopedSamplingState {
    fn drop(&mut self) {
        bucket(self.index).store(self.previous, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    static WALKING: SamplingState = SamplingState {
        category: "test",
        name: "walking",
    };
    static RUNNING: SamplingState = SamplingState {
        category: "test",
        name: "running",
    };

    #[rstest]
    fn set_and_read_back() {
        set_sampling_state(0, &WALKING);
        let current = current_sampling_state(0).unwrap();
        assert_eq!(current.name, "walking");
        clear_sampling_state(0);
        assert!(current_sampling_state(0).is_none());
    }

    #[rstest]
    fn scoped_state_restores_previous() {
        set_sampling_state(1, &WALKING);
        {
            let _scope = ScopedSamplingState::new(1, &RUNNING);
            assert_eq!(current_sampling_state(1).unwrap().name, "running");
        }
        assert_eq!(current_sampling_state(1).unwrap().name, "walking");
        clear_sampling_state(1);
    }

    #[rstest]
    fn empty_bucket_reads_none() {
        assert!(current_sampling_state(2).is_none());
    }
}
