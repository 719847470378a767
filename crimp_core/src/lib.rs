pub mod compressor;
pub mod config;
pub mod error;
pub mod header;
pub mod policy;
pub mod stats;
pub mod throttle;

pub use compressor::Compressor;
pub use config::{Algorithm, CompressionConfig};
pub use error::CompressError;
pub use stats::{CodecStats, StatsSnapshot};
pub use throttle::LogThrottle;
