use crimp_core::config::{Algorithm, CompressionConfig};
use crimp_core::error::CompressError;
use crimp_core::{Compressor, LogThrottle};

const LOG_THROTTLE_STEP: u64 = 10_000;

/// Snappy block compressor — the simplicity baseline.
///
/// Snappy's raw block format self-describes the decompressed length, so this
/// variant writes no header of its own; the stored block is the backend's
/// output verbatim. It also applies no admission policy: the compressed form
/// is always kept, even when it came out larger (a throttled debug-gated
/// warning notes such blocks). The configured level is ignored.
pub struct SnappyCompressor {
    cache_name: String,
}

impl SnappyCompressor {
    pub fn new(cache_name: &str, _cfg: &CompressionConfig) -> Result<Self, CompressError> {
        tracing::info!(cache = cache_name, "Snappy compression configured");
        Ok(Self {
            cache_name: cache_name.to_owned(),
        })
    }

    fn backend_err(&self, op: &'static str, len: usize, e: impl ToString) -> CompressError {
        CompressError::Decode {
            cache: self.cache_name.clone(),
            op,
            len,
            reason: e.to_string(),
        }
    }
}

impl Compressor for SnappyCompressor {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Snappy
    }

    fn throttle(&self) -> LogThrottle {
        LogThrottle::new(LOG_THROTTLE_STEP)
    }

    fn try_compress(
        &self,
        block: &[u8],
        throttle: &mut LogThrottle,
    ) -> Result<Option<Vec<u8>>, CompressError> {
        let compressed = snap::raw::Encoder::new()
            .compress_vec(block)
            .map_err(|e| self.backend_err("compress", block.len(), e))?;

        if compressed.len() >= block.len()
            && tracing::enabled!(tracing::Level::DEBUG)
            && throttle.should_log()
        {
            tracing::warn!(
                cache = %self.cache_name,
                source_len = block.len(),
                compressed_len = compressed.len(),
                "compression is not efficient"
            );
        }

        Ok(Some(compressed))
    }

    fn decompress(&self, block: &[u8]) -> Result<Vec<u8>, CompressError> {
        snap::raw::Decoder::new()
            .decompress_vec(block)
            .map_err(|e| self.backend_err("decompress", block.len(), e))
    }
}
