//! Admission policy: decide whether a compressed block replaces the raw one.
//!
//! Not every block benefits from compression. Keeping a result that is as
//! large as the input makes storage worse, and keeping one that is barely
//! smaller buys a few bytes at the cost of a decompression call on every
//! future read. Both checks are pure functions of the two lengths; rejection
//! is a normal outcome, not an error.

/// Minimum absolute saving, in bytes, before the advanced (Zstd) variant
/// keeps a compressed block.
pub const MIN_DELTA_BYTES: usize = 8;

/// Did compression shrink the block at all? Used by every variant; failing
/// this means "store raw" (plus a throttled diagnostic).
pub fn shrank(input_len: usize, compressed_len: usize) -> bool {
    compressed_len < input_len
}

/// Zstd admission: the stored block (after any class-3 padding) must save
/// strictly more than [`MIN_DELTA_BYTES`] to be worth the decode CPU on
/// every future read.
pub fn worth_keeping(input_len: usize, stored_len: usize) -> bool {
    input_len.saturating_sub(stored_len) > MIN_DELTA_BYTES
}
