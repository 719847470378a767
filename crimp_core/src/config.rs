use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CompressError;

/// Block compression algorithm selector.
///
/// Maps one-to-one onto the concrete `Compressor` variants in `crimp_codecs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Lz4,
    Snappy,
    Zstd,
}

impl Algorithm {
    /// Legal compression level range, or `None` when the algorithm has no
    /// level knob at all (Snappy ignores it).
    pub fn level_range(self) -> Option<(i32, i32)> {
        match self {
            Algorithm::Lz4 => Some((0, 17)),
            Algorithm::Zstd => Some((-131_072, 22)),
            Algorithm::Snappy => None,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Algorithm::Lz4 => "lz4",
            Algorithm::Snappy => "snappy",
            Algorithm::Zstd => "zstd",
        };
        f.write_str(name)
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lz4" => Ok(Algorithm::Lz4),
            "snappy" => Ok(Algorithm::Snappy),
            "zstd" => Ok(Algorithm::Zstd),
            other => Err(format!(
                "unknown algorithm '{}'. Valid options: lz4, snappy, zstd",
                other
            )),
        }
    }
}

/// Per-cache compression settings.
///
/// Created once at cache start and immutable thereafter. The variant
/// constructors call [`validate`](CompressionConfig::validate) and fail fast
/// on an out-of-range level, so a bad level never reaches the hot path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Master switch, consulted by the calling engine. A disabled config is
    /// still a valid config; this layer does not interpret the flag.
    pub enabled: bool,

    /// Which variant to build.
    pub algorithm: Algorithm,

    /// Compression level, interpreted per algorithm.
    /// LZ4: 0 = fast mode, 1..=17 = high-compression mode at that level.
    /// Zstd: -131072..=22, 0 = library default.
    /// Snappy: ignored.
    pub level: i32,

    /// When set, every compressed block is immediately decompressed and
    /// compared byte-for-byte with the input. Doubles CPU cost per block;
    /// meant for testing and staging, not production.
    pub self_check: bool,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            algorithm: Algorithm::Snappy,
            level: 0,
            self_check: false,
        }
    }
}

impl CompressionConfig {
    /// Check the level against the algorithm's legal range.
    pub fn validate(&self) -> Result<(), CompressError> {
        if let Some((min, max)) = self.algorithm.level_range() {
            if self.level < min || self.level > max {
                return Err(CompressError::InvalidConfiguration {
                    algorithm: self.algorithm,
                    level: self.level,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }
}
