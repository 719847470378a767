use crate::config::Algorithm;
use crate::error::CompressError;
use crate::throttle::LogThrottle;

/// Block compressor abstraction.
///
/// Each implementation owns its on-disk header layout and tuning knobs; the
/// stored representation of a block is exactly `header ++ payload`, with no
/// separate length field and no magic number. Construction validates the
/// configuration and fails fast; afterwards both operations are reentrant,
/// synchronous, CPU-bound, and safe to call from many threads against one
/// shared instance (`Arc<dyn Compressor>`). The only shared mutable state a
/// variant may carry is lock-free statistics counters.
///
/// Compression is deterministic: the same block and configuration always
/// produce the same output, so callers propagate failures instead of
/// retrying.
pub trait Compressor: Send + Sync {
    /// Which algorithm this variant implements.
    fn algorithm(&self) -> Algorithm;

    /// A fresh diagnostics throttle pre-set to this variant's sampling
    /// step. Each worker thread keeps its own and passes it to
    /// [`try_compress`](Self::try_compress); the counter is never shared.
    fn throttle(&self) -> LogThrottle;

    /// Compress `block` and decide whether the result is worth keeping.
    ///
    /// `Ok(Some(bytes))` is the header-prefixed compressed block to store.
    /// `Ok(None)` means compression did not pay — the caller must store the
    /// raw block unchanged. Errors are genuine failures (backend error or a
    /// self-check mismatch), never a rejection.
    fn try_compress(
        &self,
        block: &[u8],
        throttle: &mut LogThrottle,
    ) -> Result<Option<Vec<u8>>, CompressError>;

    /// Reconstruct the original bytes of a block previously returned by
    /// [`try_compress`](Self::try_compress). The header sizes the output
    /// buffer from above; the result is trimmed to the actual decompressed
    /// length.
    fn decompress(&self, block: &[u8]) -> Result<Vec<u8>, CompressError>;
}
