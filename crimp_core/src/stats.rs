//! Concurrent compression statistics.
//!
//! One [`CodecStats`] is shared by every thread using a compressor instance.
//! All counters are lock-free, monotonically increasing, and never reset for
//! the lifetime of the instance. Relaxed ordering is sufficient: the values
//! only feed a periodic diagnostic line, and which thread happens to cross
//! the reporting boundary is an accepted race.

use std::sync::atomic::{AtomicU64, Ordering};

/// A diagnostic line is emitted every this many samples.
pub const PRINT_PER: u64 = 65_536;

#[derive(Debug, Default)]
pub struct CodecStats {
    total_samples: AtomicU64,
    accepted_samples: AtomicU64,
    uncompressed_bytes: AtomicU64,
    compressed_bytes: AtomicU64,
}

impl CodecStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account one `try_compress` outcome. `stored_len` is the size that
    /// actually goes to storage: the compressed block when accepted, the
    /// original block when the admission policy rejected it.
    ///
    /// Returns a snapshot every [`PRINT_PER`] samples so the caller can log
    /// the running ratio without this crate owning the log line.
    pub fn record(
        &self,
        input_len: usize,
        stored_len: usize,
        accepted: bool,
    ) -> Option<StatsSnapshot> {
        self.uncompressed_bytes
            .fetch_add(input_len as u64, Ordering::Relaxed);
        self.compressed_bytes
            .fetch_add(stored_len as u64, Ordering::Relaxed);
        if accepted {
            self.accepted_samples.fetch_add(1, Ordering::Relaxed);
        }
        let total = self.total_samples.fetch_add(1, Ordering::Relaxed) + 1;
        (total % PRINT_PER == 0).then(|| self.snapshot())
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_samples: self.total_samples.load(Ordering::Relaxed),
            accepted_samples: self.accepted_samples.load(Ordering::Relaxed),
            uncompressed_bytes: self.uncompressed_bytes.load(Ordering::Relaxed),
            compressed_bytes: self.compressed_bytes.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub total_samples: u64,
    pub accepted_samples: u64,
    pub uncompressed_bytes: u64,
    pub compressed_bytes: u64,
}

impl StatsSnapshot {
    /// Running compression ratio: stored bytes over original bytes.
    pub fn ratio(&self) -> f64 {
        if self.uncompressed_bytes == 0 {
            return 1.0;
        }
        self.compressed_bytes as f64 / self.uncompressed_bytes as f64
    }

    /// Percentage of samples the admission policy accepted.
    pub fn acceptance_pct(&self) -> u64 {
        if self.total_samples == 0 {
            return 0;
        }
        self.accepted_samples * 100 / self.total_samples
    }
}
