use thiserror::Error;

use crate::config::Algorithm;

/// Errors surfaced by the compression layer.
///
/// Admission rejection ("compression did not pay, store the raw block") is
/// deliberately NOT represented here — it is the `Ok(None)` outcome of
/// [`Compressor::try_compress`](crate::Compressor::try_compress). Everything
/// below is a genuine failure, and since compression is deterministic none
/// of these are worth retrying: a failure on attempt N recurs on N+1.
#[derive(Debug, Error)]
pub enum CompressError {
    /// Level outside the algorithm's legal range. Fatal at cache start.
    #[error("compression level {level} out of range for {algorithm} (allowed {min}..={max})")]
    InvalidConfiguration {
        algorithm: Algorithm,
        level: i32,
        min: i32,
        max: i32,
    },

    /// The registry has no factory registered for the requested algorithm.
    #[error("no compressor registered for algorithm '{algorithm}' \
             (the variant was unregistered or replaced without a substitute)")]
    ModuleUnavailable { algorithm: Algorithm },

    /// Decode met a header byte no encoder could have written. Never
    /// guessed around: the buffer-size hint cannot be trusted past this.
    #[error("corrupt compression header {value:#04x}: {reason}")]
    CorruptHeader { value: u8, reason: &'static str },

    /// The backend reported an error or a size the codec cannot reconcile.
    #[error("cache '{cache}': failed to {op} block of {len} bytes: {reason}")]
    Decode {
        cache: String,
        op: &'static str,
        len: usize,
        reason: String,
    },

    /// Self-check mode found a round trip that did not reproduce the input.
    /// Indicates a codec bug; always fatal for the block.
    #[error("cache '{cache}': self-check mismatch, input {input_len} bytes \
             but round trip produced {output_len}")]
    SelfCheckMismatch {
        cache: String,
        input_len: usize,
        output_len: usize,
    },
}
