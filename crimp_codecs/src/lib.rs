mod lz4_codec;
mod snappy_codec;
mod zstd_codec;

pub use lz4_codec::{Lz4Compressor, Lz4Format};
pub use snappy_codec::SnappyCompressor;
pub use zstd_codec::ZstdCompressor;

use std::collections::HashMap;

use crimp_core::config::{Algorithm, CompressionConfig};
use crimp_core::error::CompressError;
use crimp_core::Compressor;

/// Builds a configured [`Compressor`] for one cache.
///
/// The plugin seam: the built-in variants register one of these per
/// algorithm, and an embedding engine may override a slot with its own
/// implementation via [`CompressorRegistry::register`].
pub trait CompressorFactory: Send + Sync {
    fn create(
        &self,
        cache_name: &str,
        cfg: &CompressionConfig,
    ) -> Result<Box<dyn Compressor>, CompressError>;
}

impl<F> CompressorFactory for F
where
    F: Fn(&str, &CompressionConfig) -> Result<Box<dyn Compressor>, CompressError> + Send + Sync,
{
    fn create(
        &self,
        cache_name: &str,
        cfg: &CompressionConfig,
    ) -> Result<Box<dyn Compressor>, CompressError> {
        self(cache_name, cfg)
    }
}

/// Factory registry keyed by algorithm tag.
///
/// Variant selection is a compile-time enum dispatch, so a misspelled
/// algorithm cannot reach this point; [`CompressError::ModuleUnavailable`]
/// only occurs when a slot was deliberately emptied or the registry was
/// built without the built-ins.
pub struct CompressorRegistry {
    factories: HashMap<Algorithm, Box<dyn CompressorFactory>>,
}

impl Default for CompressorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CompressorRegistry {
    /// Registry pre-populated with the three bundled variants.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(Algorithm::Lz4, Box::new(|cache: &str, cfg: &CompressionConfig| {
            Ok(Box::new(Lz4Compressor::new(cache, cfg)?) as Box<dyn Compressor>)
        }));
        registry.register(Algorithm::Snappy, Box::new(|cache: &str, cfg: &CompressionConfig| {
            Ok(Box::new(SnappyCompressor::new(cache, cfg)?) as Box<dyn Compressor>)
        }));
        registry.register(Algorithm::Zstd, Box::new(|cache: &str, cfg: &CompressionConfig| {
            Ok(Box::new(ZstdCompressor::new(cache, cfg)?) as Box<dyn Compressor>)
        }));
        registry
    }

    /// Registry with no factories at all; every lookup fails with
    /// [`CompressError::ModuleUnavailable`] until something is registered.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Install (or replace) the factory for `algorithm`.
    pub fn register(&mut self, algorithm: Algorithm, factory: Box<dyn CompressorFactory>) {
        self.factories.insert(algorithm, factory);
    }

    /// Build a compressor for `cfg.algorithm`, validating the configuration.
    pub fn create(
        &self,
        cache_name: &str,
        cfg: &CompressionConfig,
    ) -> Result<Box<dyn Compressor>, CompressError> {
        let factory = self
            .factories
            .get(&cfg.algorithm)
            .ok_or(CompressError::ModuleUnavailable {
                algorithm: cfg.algorithm,
            })?;
        factory.create(cache_name, cfg)
    }
}

/// Build a compressor from the built-in variants — the common path for
/// engines that do not plug in custom factories.
pub fn compressor_for(
    cache_name: &str,
    cfg: &CompressionConfig,
) -> Result<Box<dyn Compressor>, CompressError> {
    CompressorRegistry::builtin().create(cache_name, cfg)
}
