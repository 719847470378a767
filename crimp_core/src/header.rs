//! Block header codecs.
//!
//! A compressed block is stored as `header ++ payload` with no length field
//! and no magic number — the header alone must let the decompressor size its
//! output buffer. Two families solve this:
//!
//! - **Legacy 4-byte** (LZ4 v1): the exact original length, little-endian.
//!   Exact but taxes every block 4 bytes and leaks the plaintext size.
//! - **Hinted 1-byte** (LZ4 v2, Zstd): a size class or exponent that turns
//!   the known compressed length into an upper bound on the original length.
//!   The backend reports the actual bytes written and the result is trimmed,
//!   so the bound only has to be one-sided.
//!
//! Changing any bit layout here is a breaking storage-format change.

use crate::error::CompressError;

/// Hinted headers are a single byte.
pub const HINTED_HEADER_LEN: usize = 1;

/// Legacy headers carry the exact length as a u32.
pub const LEGACY_HEADER_LEN: usize = 4;

/// Decode buffers are capped at `i32::MAX`; any hint above this can only
/// come from a corrupt header.
pub const MAX_BUFFER_HINT: usize = i32::MAX as usize;

// ── Legacy 4-byte format (LZ4 v1) ──────────────────────────────────────────

pub fn encode_legacy(input_len: u32) -> [u8; LEGACY_HEADER_LEN] {
    input_len.to_le_bytes()
}

pub fn decode_legacy(header: [u8; LEGACY_HEADER_LEN]) -> u32 {
    u32::from_le_bytes(header)
}

// ── Hinted 1-byte format (LZ4 v2) ──────────────────────────────────────────

/// Largest encodable ratio exponent: low 4 bits of the header byte.
pub const MAX_RATIO_EXPONENT: u8 = 15;

/// Pick the smallest exponent `e` such that
/// `input_len / compressed_len < 2^e`, which guarantees
/// `compressed_len << e >= input_len`.
///
/// Returns `None` when the ratio exceeds `2^15` — the block cannot carry a
/// safe hint and the caller must store it raw. Returns `Some(0)` when there
/// is no helpful ratio (the hint degenerates to the compressed length
/// itself); admission rejects those blocks before the header is ever
/// written.
pub fn encode_ratio_exponent(input_len: usize, compressed_len: usize) -> Option<u8> {
    if compressed_len == 0 || input_len <= compressed_len {
        return Some(0);
    }
    let ratio = input_len / compressed_len;
    // Bit length of the floored ratio: smallest e with ratio < 2^e.
    let e = (usize::BITS - ratio.leading_zeros()) as u8;
    (e <= MAX_RATIO_EXPONENT).then_some(e)
}

/// Recover the decode-buffer size from a hinted header and the payload
/// length: `payload_len << e`. The high nibble of the header is reserved
/// and must be zero.
pub fn hinted_buffer_len(header: u8, payload_len: usize) -> Result<usize, CompressError> {
    if header & 0xF0 != 0 {
        return Err(CompressError::CorruptHeader {
            value: header,
            reason: "reserved high nibble set in ratio-exponent header",
        });
    }
    let e = header & 0x0F;
    let len = payload_len
        .checked_shl(u32::from(e))
        .filter(|&len| len <= MAX_BUFFER_HINT && (len >> e) == payload_len)
        .ok_or(CompressError::CorruptHeader {
            value: header,
            reason: "buffer hint overflows the supported block size",
        })?;
    Ok(len)
}

// ── Zstd 1-byte format ─────────────────────────────────────────────────────
//
// Layout 0b0BBDDDDD:
//   bit 7    reserved, must be zero
//   bits 5-6 BB: size class, multiplier applied to the whole block length
//   bits 0-4 DDDDD: dictionary slot — 0 reserved, 1..=30 rotating
//            dictionaries (future), 31 no dictionary (always written today)

const ZSTD_BUF_LEN_SHIFT: u8 = 5;
const ZSTD_BUF_LEN_MASK: u8 = 0b0110_0000;
const ZSTD_DICT_MASK: u8 = 0b0001_1111;

/// Dictionary slot meaning "no dictionary".
pub const ZSTD_DICT_NONE: u8 = 31;

/// Buffer multipliers indexed by size class.
pub const ZSTD_MULTIPLIERS: [usize; 4] = [4, 32, 256, 2048];

/// Outcome of size-class selection at compress time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZstdSizeClass {
    /// Smallest class whose multiplier times the stored block length covers
    /// the input length.
    Fits(u8),
    /// Even class 3 (2048x) falls short: the stored block must be grown
    /// (zero-padded) to `stored_len` so that `stored_len * 2048 >=
    /// input_len`, and class 3 written.
    Padded { stored_len: usize },
}

/// Select the size class for a block of `block_len` stored bytes (header
/// byte included) holding `input_len` original bytes.
pub fn zstd_size_class(input_len: usize, block_len: usize) -> ZstdSizeClass {
    for (class, mult) in ZSTD_MULTIPLIERS.iter().enumerate() {
        if block_len.saturating_mul(*mult) >= input_len {
            return ZstdSizeClass::Fits(class as u8);
        }
    }
    // Ceiling division: a floored length times 2048 can fall up to 2047
    // bytes short of the input and the decode buffer would truncate.
    ZstdSizeClass::Padded {
        stored_len: input_len.div_ceil(ZSTD_MULTIPLIERS[3]),
    }
}

/// Assemble the header byte from a size class and a dictionary slot.
pub fn zstd_encode_header(size_class: u8, dict: u8) -> u8 {
    debug_assert!(size_class < 4, "size class {size_class} out of range");
    debug_assert!(dict & !ZSTD_DICT_MASK == 0, "dictionary slot {dict} out of range");
    (size_class << ZSTD_BUF_LEN_SHIFT) | dict
}

/// Recover the decode-buffer size from a Zstd header and the total stored
/// block length (header byte included).
pub fn zstd_buffer_len(header: u8, block_len: usize) -> Result<usize, CompressError> {
    if header == 0 {
        return Err(CompressError::CorruptHeader {
            value: header,
            reason: "zero header byte",
        });
    }
    if header & 0x80 != 0 {
        return Err(CompressError::CorruptHeader {
            value: header,
            reason: "reserved high bit set",
        });
    }
    let class = (header & ZSTD_BUF_LEN_MASK) >> ZSTD_BUF_LEN_SHIFT;
    let len = block_len
        .checked_mul(ZSTD_MULTIPLIERS[class as usize])
        .filter(|&len| len <= MAX_BUFFER_HINT)
        .ok_or(CompressError::CorruptHeader {
            value: header,
            reason: "buffer hint overflows the supported block size",
        })?;
    Ok(len)
}

/// Dictionary slot carried by a Zstd header. Slots 1..=30 are reserved for
/// the future dictionary-rotation feature; decoders ignore the field today.
pub fn zstd_dict_slot(header: u8) -> u8 {
    header & ZSTD_DICT_MASK
}
