//! Sampling rate limiter for hot-path diagnostics.
//!
//! An "inefficient compression" warning emitted per failing block would
//! flood the log at millions of ops per second. Each worker thread owns one
//! [`LogThrottle`] (obtained from [`Compressor::throttle`]) and passes it by
//! `&mut` through the call, so the hot path needs no shared synchronization
//! and no thread-local storage. Threads interleave independently, which
//! makes the overall rate approximate; that is acceptable for diagnostics.
//!
//! [`Compressor::throttle`]: crate::Compressor::throttle

#[derive(Debug, Clone)]
pub struct LogThrottle {
    step: u64,
    count: u64,
}

impl LogThrottle {
    pub fn new(step: u64) -> Self {
        debug_assert!(step > 0);
        Self { step, count: 0 }
    }

    /// True on the first call and then once every `step` calls. The counter
    /// advances on every call, so N consecutive failures fire at counts
    /// 0, step, 2*step, ...
    pub fn should_log(&mut self) -> bool {
        let fire = self.count % self.step == 0;
        self.count += 1;
        fire
    }
}
