use lz4::block::{compress, decompress, CompressionMode};

use crimp_core::config::{Algorithm, CompressionConfig};
use crimp_core::error::CompressError;
use crimp_core::header::{
    decode_legacy, encode_legacy, encode_ratio_exponent, hinted_buffer_len, MAX_BUFFER_HINT,
};
use crimp_core::policy;
use crimp_core::{Compressor, LogThrottle};

const LOG_THROTTLE_STEP: u64 = 100_000;

/// On-disk header layout for LZ4 blocks, fixed at construction.
///
/// Both layouts decode forever; `Hinted` is the default for new caches.
/// Switching an existing cache is a breaking storage-format change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lz4Format {
    /// v1: 4-byte exact original length. Simple, but taxes every block
    /// 4 bytes and leaks the exact plaintext size.
    Legacy,
    /// v2: 1-byte ratio-exponent buffer hint.
    #[default]
    Hinted,
}

/// LZ4 block compressor.
///
/// Level 0 selects the fast mode; 1..=17 the high-compression mode at that
/// level. A block whose compressed form is not strictly smaller than the
/// input is rejected (`Ok(None)`), with a throttled debug-gated warning.
pub struct Lz4Compressor {
    cache_name: String,
    level: i32,
    format: Lz4Format,
}

impl Lz4Compressor {
    pub fn new(cache_name: &str, cfg: &CompressionConfig) -> Result<Self, CompressError> {
        Self::with_format(cache_name, cfg, Lz4Format::default())
    }

    pub fn with_format(
        cache_name: &str,
        cfg: &CompressionConfig,
        format: Lz4Format,
    ) -> Result<Self, CompressError> {
        let (min, max) = Algorithm::Lz4
            .level_range()
            .expect("lz4 has a level range");
        if cfg.level < min || cfg.level > max {
            return Err(CompressError::InvalidConfiguration {
                algorithm: Algorithm::Lz4,
                level: cfg.level,
                min,
                max,
            });
        }
        tracing::info!(
            cache = cache_name,
            level = cfg.level,
            ?format,
            "LZ4 compression configured"
        );
        Ok(Self {
            cache_name: cache_name.to_owned(),
            level: cfg.level,
            format,
        })
    }

    fn mode(&self) -> Option<CompressionMode> {
        if self.level == 0 {
            Some(CompressionMode::FAST(1))
        } else {
            Some(CompressionMode::HIGHCOMPRESSION(self.level))
        }
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

impl Compressor for Lz4Compressor {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Lz4
    }

    fn throttle(&self) -> LogThrottle {
        LogThrottle::new(LOG_THROTTLE_STEP)
    }

    fn try_compress(
        &self,
        block: &[u8],
        throttle: &mut LogThrottle,
    ) -> Result<Option<Vec<u8>>, CompressError> {
        let compressed = compress(block, self.mode(), false)
            .map_err(|e| self.backend_err("compress", block.len(), e))?;

        if !policy::shrank(block.len(), compressed.len()) {
            if tracing::enabled!(tracing::Level::DEBUG) && throttle.should_log() {
                tracing::warn!(
                    cache = %self.cache_name,
                    source_len = block.len(),
                    compressed_len = compressed.len(),
                    "compression is not efficient"
                );
            }
            return Ok(None);
        }

        let out = match self.format {
            Lz4Format::Legacy => {
                if block.len() > u32::MAX as usize {
                    return Err(self.backend_err(
                        "compress",
                        block.len(),
                        "block too large for the legacy 4-byte header",
                    ));
                }
                let mut out = Vec::with_capacity(4 + compressed.len());
                out.extend_from_slice(&encode_legacy(block.len() as u32));
                out.extend_from_slice(&compressed);
                out
            }
            Lz4Format::Hinted => {
                // Ratios beyond 2^15 have no encodable hint; store raw.
                let Some(exponent) = encode_ratio_exponent(block.len(), compressed.len()) else {
                    return Ok(None);
                };
                let mut out = Vec::with_capacity(1 + compressed.len());
                out.push(exponent);
                out.extend_from_slice(&compressed);
                out
            }
        };
        Ok(Some(out))
    }

    fn decompress(&self, block: &[u8]) -> Result<Vec<u8>, CompressError> {
        match self.format {
            Lz4Format::Legacy => {
                if block.len() < 4 {
                    return Err(self.backend_err(
                        "decompress",
                        block.len(),
                        "block shorter than the legacy header",
                    ));
                }
                let header: [u8; 4] = block[..4].try_into().expect("4-byte slice");
                let original_len = decode_legacy(header) as usize;
                if original_len > MAX_BUFFER_HINT {
                    return Err(self.backend_err(
                        "decompress",
                        block.len(),
                        "legacy header length exceeds the supported block size",
                    ));
                }
                decompress(&block[4..], Some(original_len as i32))
                    .map_err(|e| self.backend_err("decompress", block.len(), e))
            }
            Lz4Format::Hinted => {
                let (&header, payload) = block.split_first().ok_or_else(|| {
                    self.backend_err("decompress", 0, "empty block")
                })?;
                let buffer_len = hinted_buffer_len(header, payload.len())?;
                // The backend reports the actual length; the hint only has
                // to bound it from above and the result is trimmed.
                decompress(payload, Some(buffer_len as i32))
                    .map_err(|e| self.backend_err("decompress", block.len(), e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compressor(level: i32, format: Lz4Format) -> Lz4Compressor {
        let cfg = CompressionConfig {
            algorithm: Algorithm::Lz4,
            level,
            ..Default::default()
        };
        Lz4Compressor::with_format("test-cache", &cfg, format).unwrap()
    }

    #[test]
    fn rejects_out_of_range_level() {
        let cfg = CompressionConfig {
            algorithm: Algorithm::Lz4,
            level: 18,
            ..Default::default()
        };
        assert!(matches!(
            Lz4Compressor::new("c", &cfg),
            Err(CompressError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn hinted_round_trip_ten_thousand_zeros() {
        let comp = compressor(0, Lz4Format::Hinted);
        let input = vec![0u8; 10_000];
        let block = comp
            .try_compress(&input, &mut comp.throttle())
            .unwrap()
            .expect("zeros must compress");
        assert!(block.len() < input.len());

        // Header: low nibble only, and its hint covers the input.
        let header = block[0];
        assert_eq!(header & 0xF0, 0);
        assert!(hinted_buffer_len(header, block.len() - 1).unwrap() >= input.len());

        assert_eq!(comp.decompress(&block).unwrap(), input);
    }

    #[test]
    fn legacy_round_trip_records_exact_length() {
        let comp = compressor(0, Lz4Format::Legacy);
        let input = b"abcabcabcabcabcabcabcabcabcabcabcabc".repeat(64);
        let block = comp
            .try_compress(&input, &mut comp.throttle())
            .unwrap()
            .expect("repetitive input must compress");
        assert_eq!(
            u32::from_le_bytes(block[..4].try_into().unwrap()) as usize,
            input.len()
        );
        assert_eq!(comp.decompress(&block).unwrap(), input);
    }

    #[test]
    fn high_compression_levels_round_trip() {
        for level in [1, 9, 17] {
            let comp = compressor(level, Lz4Format::Hinted);
            let input = b"the quick brown fox jumps over the lazy dog. ".repeat(200);
            let block = comp
                .try_compress(&input, &mut comp.throttle())
                .unwrap()
                .expect("text must compress");
            assert_eq!(comp.decompress(&block).unwrap(), input, "level {level}");
        }
    }

    #[test]
    fn incompressible_block_is_rejected() {
        let comp = compressor(0, Lz4Format::Hinted);
        let mut throttle = comp.throttle();
        assert!(comp.try_compress(&[7, 42, 13, 200], &mut throttle).unwrap().is_none());
        // Idempotent: same outcome on a second attempt.
        assert!(comp.try_compress(&[7, 42, 13, 200], &mut throttle).unwrap().is_none());
    }

    #[test]
    fn corrupt_hinted_header_is_refused() {
        let comp = compressor(0, Lz4Format::Hinted);
        let mut block = comp
            .try_compress(&vec![0u8; 4096], &mut comp.throttle())
            .unwrap()
            .unwrap();
        block[0] |= 0xF0;
        assert!(matches!(
            comp.decompress(&block),
            Err(CompressError::CorruptHeader { .. })
        ));
    }

    #[test]
    fn truncated_legacy_block_is_refused() {
        let comp = compressor(0, Lz4Format::Legacy);
        assert!(matches!(
            comp.decompress(&[1, 0]),
            Err(CompressError::Decode { .. })
        ));
    }
}
