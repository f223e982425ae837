//! Monotonic and thread-CPU clocks plus the cached thread id.

use std::cell::Cell;

fn clock_us(clock: libc::clockid_t) -> i64 {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    unsafe {
        libc::clock_gettime(clock, &mut ts);
    }
    ts.tv_sec as i64 * 1_000_000 + ts.tv_nsec as i64 / 1_000
}

/// Wall timestamp in microseconds, CLOCK_MONOTONIC.
#[inline]
pub fn now_us() -> i64 {
    clock_us(libc::CLOCK_MONOTONIC)
}

/// Thread CPU time in microseconds, CLOCK_THREAD_CPUTIME_ID.
#[inline]
pub fn thread_now_us() -> i64 {
    clock_us(libc::CLOCK_THREAD_CPUTIME_ID)
}

thread_local! {
    static CACHED_TID: Cell<i32> = const { Cell::new(0) };
}

/// Kernel thread id, fetched once per thread via gettid.
#[inline]
pub fn current_thread_id() -> i32 {
    CACHED_TID.with(|cache| {
        let tid = cache.get();
        if tid != 0 {
            return tid;
        }
        let tid = unsafe { libc::syscall(libc::SYS_gettid) as i32 };
        cache.set(tid);
        tid
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn monotonic_clock_does_not_go_backwards() {
        let a = now_us();
        let b = now_us();
        assert!(b >= a);
    }

    #[rstest]
    fn thread_id_is_stable_within_a_thread() {
        assert_eq!(current_thread_id(), current_thread_id());
        assert!(current_thread_id() > 0);
    }

    #[rstest]
    fn thread_id_differs_across_threads() {
        let here = current_thread_id();
        let there = std::thread::spawn(current_thread_id).join().unwrap();
        assert_ne!(here, there);
    }

    #[rstest]
    fn thread_clock_advances_with_work() {
        let start = thread_now_us();
        let mut acc = 0u64;
        for i in 0..2_000_000u64 {
            acc = acc.wrapping_add(i);
        }
        std::hint::black_box(acc);
        assert!(thread_now_us() >= start);
    }
}
