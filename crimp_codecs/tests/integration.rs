//! Cross-variant integration tests: the storage-engine contract.
//!
//! A stored block is exactly `header ++ payload` — no length field, no magic
//! number. Whatever `try_compress` returns must decompress back to the
//! original bytes, and `Ok(None)` means the caller keeps the raw block.
use std::sync::Arc;

use crimp_codecs::{compressor_for, Lz4Compressor, Lz4Format};
use crimp_core::config::{Algorithm, CompressionConfig};
use crimp_core::Compressor;

/// Generate `len` deterministic bytes using a simple LCG.
fn pseudo_random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = seed;
    (0..len)
        .map(|_| {
            rng = rng
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (rng >> 56) as u8
        })
        .collect()
}

/// Generate `len` highly compressible bytes (repeating pattern).
fn compressible_bytes(len: usize) -> Vec<u8> {
    let pattern = b"the quick brown fox jumps over the lazy dog. ";
    (0..len).map(|i| pattern[i % pattern.len()]).collect()
}

fn config(algorithm: Algorithm, level: i32) -> CompressionConfig {
    CompressionConfig {
        algorithm,
        level,
        ..Default::default()
    }
}

// ── round trips ────────────────────────────────────────────────────────────

#[test]
fn round_trip_every_variant_and_level() {
    let configs = [
        config(Algorithm::Lz4, 0),
        config(Algorithm::Lz4, 9),
        config(Algorithm::Snappy, 0),
        config(Algorithm::Zstd, 0),
        config(Algorithm::Zstd, 3),
        config(Algorithm::Zstd, 19),
    ];
    let input = compressible_bytes(48 * 1024);

    for cfg in &configs {
        let comp = compressor_for("round-trip", cfg).unwrap();
        let mut throttle = comp.throttle();
        let stored = comp
            .try_compress(&input, &mut throttle)
            .unwrap()
            .expect("compressible input must be kept");
        assert!(
            stored.len() < input.len(),
            "{} level {} did not shrink the block",
            cfg.algorithm,
            cfg.level
        );
        assert_eq!(
            comp.decompress(&stored).unwrap(),
            input,
            "{} level {} round trip",
            cfg.algorithm,
            cfg.level
        );
    }
}

/// The concrete scenario from the storage contract: 10,000 zero bytes under
/// LZ4 fast mode come back byte-exact through the 1-byte hinted header.
#[test]
fn lz4_ten_thousand_zeros_scenario() {
    let comp = compressor_for("zeros", &config(Algorithm::Lz4, 0)).unwrap();
    let input = vec![0u8; 10_000];
    let stored = comp
        .try_compress(&input, &mut comp.throttle())
        .unwrap()
        .expect("zeros compress well");
    assert!(stored.len() * 4 < input.len(), "expected a deep shrink");

    // One header byte: exponent e with payload_len << e covering the input.
    let exponent = stored[0];
    assert_eq!(exponent & 0xF0, 0);
    let payload_len = stored.len() - 1;
    assert!(payload_len << exponent >= input.len());
    assert!(exponent == 0 || payload_len << (exponent - 1) < input.len() * 2);

    assert_eq!(comp.decompress(&stored).unwrap(), input);
}

// ── admission behavior ─────────────────────────────────────────────────────

/// Four random bytes expand under any algorithm. LZ4 and Zstd reject and
/// tell the caller to store the raw block; Snappy has no admission policy
/// and keeps its output regardless.
#[test]
fn tiny_random_block_admission_differs_per_variant() {
    let input = pseudo_random_bytes(4, 0xDEAD_BEEF);

    for algorithm in [Algorithm::Lz4, Algorithm::Zstd] {
        let comp = compressor_for("tiny", &config(algorithm, 0)).unwrap();
        assert!(
            comp.try_compress(&input, &mut comp.throttle())
                .unwrap()
                .is_none(),
            "{algorithm} should reject a 4-byte random block"
        );
    }

    let snappy = compressor_for("tiny", &config(Algorithm::Snappy, 0)).unwrap();
    let stored = snappy
        .try_compress(&input, &mut snappy.throttle())
        .unwrap()
        .expect("snappy keeps everything");
    assert_eq!(snappy.decompress(&stored).unwrap(), input);
}

#[test]
fn high_entropy_block_is_rejected_by_zstd() {
    let comp = compressor_for("entropy", &config(Algorithm::Zstd, 3)).unwrap();
    let input = pseudo_random_bytes(64 * 1024, 0x1234_5678);
    assert!(comp
        .try_compress(&input, &mut comp.throttle())
        .unwrap()
        .is_none());
}

/// Pure function of input and configuration: two runs, identical bytes.
#[test]
fn try_compress_is_idempotent() {
    let input = compressible_bytes(8 * 1024);
    for algorithm in [Algorithm::Lz4, Algorithm::Snappy, Algorithm::Zstd] {
        let comp = compressor_for("idem", &config(algorithm, 0)).unwrap();
        let mut throttle = comp.throttle();
        let first = comp.try_compress(&input, &mut throttle).unwrap();
        let second = comp.try_compress(&input, &mut throttle).unwrap();
        assert_eq!(first, second, "{algorithm} output must be deterministic");
    }
}

// ── formats and configuration ──────────────────────────────────────────────

#[test]
fn lz4_legacy_and_hinted_formats_coexist() {
    let cfg = config(Algorithm::Lz4, 0);
    let legacy = Lz4Compressor::with_format("fmt", &cfg, Lz4Format::Legacy).unwrap();
    let hinted = Lz4Compressor::with_format("fmt", &cfg, Lz4Format::Hinted).unwrap();
    let input = compressible_bytes(4096);

    let legacy_block = legacy
        .try_compress(&input, &mut legacy.throttle())
        .unwrap()
        .unwrap();
    let hinted_block = hinted
        .try_compress(&input, &mut hinted.throttle())
        .unwrap()
        .unwrap();

    // Same payload, 3 header bytes apart.
    assert_eq!(legacy_block.len(), hinted_block.len() + 3);
    assert_eq!(legacy.decompress(&legacy_block).unwrap(), input);
    assert_eq!(hinted.decompress(&hinted_block).unwrap(), input);
}

#[test]
fn invalid_levels_fail_at_construction() {
    assert!(compressor_for("bad", &config(Algorithm::Lz4, 18)).is_err());
    assert!(compressor_for("bad", &config(Algorithm::Zstd, 23)).is_err());
    assert!(compressor_for("bad", &config(Algorithm::Zstd, -131_073)).is_err());
    // Snappy ignores the level entirely.
    assert!(compressor_for("ok", &config(Algorithm::Snappy, 9999)).is_ok());
}

#[test]
fn self_check_mode_round_trips() {
    let cfg = CompressionConfig {
        algorithm: Algorithm::Zstd,
        level: 3,
        self_check: true,
        ..Default::default()
    };
    let comp = compressor_for("checked", &cfg).unwrap();
    let input = compressible_bytes(32 * 1024);
    let stored = comp
        .try_compress(&input, &mut comp.throttle())
        .unwrap()
        .expect("compressible input");
    assert_eq!(comp.decompress(&stored).unwrap(), input);
}

// ── concurrency ────────────────────────────────────────────────────────────

/// One configured instance shared by many threads without locking; each
/// thread owns its throttle and works on disjoint blocks.
#[test]
fn shared_instance_across_threads() {
    for algorithm in [Algorithm::Lz4, Algorithm::Snappy, Algorithm::Zstd] {
        let comp: Arc<dyn Compressor> =
            Arc::from(compressor_for("shared", &config(algorithm, 0)).unwrap());

        let mut handles = Vec::new();
        for worker in 0..4u64 {
            let comp = Arc::clone(&comp);
            handles.push(std::thread::spawn(move || {
                let mut throttle = comp.throttle();
                for i in 0..64 {
                    let input = compressible_bytes(1024 + (worker as usize * 64) + i);
                    match comp.try_compress(&input, &mut throttle).unwrap() {
                        Some(stored) => {
                            assert_eq!(comp.decompress(&stored).unwrap(), input)
                        }
                        None => {} // caller keeps the raw block
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
