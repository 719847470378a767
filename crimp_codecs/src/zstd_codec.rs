use std::io::Read;

use crimp_core::config::{Algorithm, CompressionConfig};
use crimp_core::error::CompressError;
use crimp_core::header::{
    zstd_buffer_len, zstd_encode_header, zstd_size_class, ZstdSizeClass, ZSTD_DICT_NONE,
};
use crimp_core::policy;
use crimp_core::{CodecStats, Compressor, LogThrottle};

const LOG_THROTTLE_STEP: u64 = 10_000;

/// Zstd block compressor — the full pipeline.
///
/// Compress-side sequence for every block:
/// 1. Compress with the configured level; the payload is stored after one
///    reserved header byte.
/// 2. Pick the smallest size class covering the input length; when even the
///    2048x class falls short, zero-pad the stored block out to
///    `ceil(input_len / 2048)` so class 3 still decodes a sufficient buffer.
/// 3. Optional self-check: decompress the candidate block and compare with
///    the input, failing the block on any mismatch. Runs before admission,
///    so even blocks about to be rejected are verified.
/// 4. Record statistics; every 65536 samples one info line reports the
///    running ratio and acceptance percentage.
/// 5. Admission: keep the block only if it saves more than 8 bytes.
pub struct ZstdCompressor {
    cache_name: String,
    level: i32,
    self_check: bool,
    stats: CodecStats,
}

impl ZstdCompressor {
    pub fn new(cache_name: &str, cfg: &CompressionConfig) -> Result<Self, CompressError> {
        let (min, max) = Algorithm::Zstd
            .level_range()
            .expect("zstd has a level range");
        if cfg.level < min || cfg.level > max {
            return Err(CompressError::InvalidConfiguration {
                algorithm: Algorithm::Zstd,
                level: cfg.level,
                min,
                max,
            });
        }
        tracing::info!(
            cache = cache_name,
            level = cfg.level,
            self_check = cfg.self_check,
            "Zstd stateless compression configured"
        );
        Ok(Self {
            cache_name: cache_name.to_owned(),
            level: cfg.level,
            self_check: cfg.self_check,
            stats: CodecStats::new(),
        })
    }

    /// Shared statistics for this instance (monotonic, never reset).
    pub fn stats(&self) -> &CodecStats {
        &self.stats
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

impl Compressor for ZstdCompressor {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Zstd
    }

    fn throttle(&self) -> LogThrottle {
        LogThrottle::new(LOG_THROTTLE_STEP)
    }

    fn try_compress(
        &self,
        block: &[u8],
        throttle: &mut LogThrottle,
    ) -> Result<Option<Vec<u8>>, CompressError> {
        let payload = zstd::bulk::compress(block, self.level)
            .map_err(|e| self.backend_err("compress", block.len(), e))?;

        let mut out = Vec::with_capacity(1 + payload.len());
        out.push(0u8);
        out.extend_from_slice(&payload);

        let class = match zstd_size_class(block.len(), out.len()) {
            ZstdSizeClass::Fits(class) => class,
            ZstdSizeClass::Padded { stored_len } => {
                out.resize(stored_len, 0);
                3
            }
        };
        out[0] = zstd_encode_header(class, ZSTD_DICT_NONE);

        if self.self_check {
            let decompressed = self.decompress(&out)?;
            if decompressed != block {
                return Err(CompressError::SelfCheckMismatch {
                    cache: self.cache_name.clone(),
                    input_len: block.len(),
                    output_len: decompressed.len(),
                });
            }
        }

        // Admission is evaluated on the stored length, padding included.
        let accepted = policy::worth_keeping(block.len(), out.len());
        let stored_len = if accepted { out.len() } else { block.len() };
        if let Some(snapshot) = self.stats.record(block.len(), stored_len, accepted) {
            tracing::info!(
                cache = %self.cache_name,
                ratio = snapshot.ratio(),
                acceptance_pct = snapshot.acceptance_pct(),
                total_samples = snapshot.total_samples,
                "compression statistics"
            );
        }

        if accepted {
            Ok(Some(out))
        } else {
            if tracing::enabled!(tracing::Level::DEBUG) && throttle.should_log() {
                tracing::warn!(
                    cache = %self.cache_name,
                    source_len = block.len(),
                    compressed_len = out.len(),
                    "compression is not efficient"
                );
            }
            Ok(None)
        }
    }

    fn decompress(&self, block: &[u8]) -> Result<Vec<u8>, CompressError> {
        let Some((&header, payload)) = block.split_first() else {
            return Err(self.backend_err("decompress", 0, "empty block"));
        };
        let max_len = zstd_buffer_len(header, block.len())?;

        // Single-frame streaming decode: class-3 padding leaves zero bytes
        // after the frame, which the bulk decompressor would reject as
        // trailing garbage.
        let decoder = zstd::stream::read::Decoder::new(payload)
            .map_err(|e| self.backend_err("decompress", block.len(), e))?
            .single_frame();

        let mut out = Vec::with_capacity(max_len.min(block.len() * 4));
        decoder
            .take(max_len as u64 + 1)
            .read_to_end(&mut out)
            .map_err(|e| self.backend_err("decompress", block.len(), e))?;
        if out.len() > max_len {
            return Err(self.backend_err(
                "decompress",
                block.len(),
                "decompressed past the buffer-size hint",
            ));
        }
        Ok(out)
    }
}
