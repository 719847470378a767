use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crimp_codecs::compressor_for;
use crimp_core::config::{Algorithm, CompressionConfig};
use crimp_core::header::{
    hinted_buffer_len, zstd_buffer_len, zstd_dict_slot, ZSTD_DICT_NONE,
};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "crimp",
    about = "Compress, decompress, and inspect crimp storage blocks",
    long_about = "Treats a whole file as one storage block. Stored blocks carry no magic \
                  number or algorithm tag — the same --algorithm (and level) used to \
                  compress must be passed to decompress.",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file into a single block
    Compress {
        /// Source file
        input: PathBuf,
        /// Destination block file
        output: PathBuf,
        /// Algorithm: lz4 | snappy | zstd
        #[arg(short, long, default_value = "zstd")]
        algorithm: Algorithm,
        /// Compression level (lz4: 0-17, zstd: -131072..=22, snappy: ignored)
        #[arg(short, long, default_value_t = 0)]
        level: i32,
        /// Verify every compressed block by an immediate round trip
        #[arg(long)]
        self_check: bool,
    },
    /// Decompress a block file back to raw bytes
    Decompress {
        /// Source block file
        input: PathBuf,
        /// Destination file
        output: PathBuf,
        /// Algorithm the block was compressed with
        #[arg(short, long)]
        algorithm: Algorithm,
    },
    /// Decode and print a block's header byte
    Inspect {
        /// Block file
        file: PathBuf,
        /// Algorithm the block was compressed with
        #[arg(short, long)]
        algorithm: Algorithm,
    },
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

fn cache_label(path: &PathBuf) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cli".to_owned())
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn run_compress(
    input: PathBuf,
    output: PathBuf,
    algorithm: Algorithm,
    level: i32,
    self_check: bool,
) -> anyhow::Result<()> {
    let cfg = CompressionConfig {
        algorithm,
        level,
        self_check,
        ..Default::default()
    };
    let comp = compressor_for(&cache_label(&input), &cfg)?;

    let raw = fs::read(&input).with_context(|| format!("reading input file {:?}", input))?;
    let t0 = Instant::now();
    let mut throttle = comp.throttle();
    let stored = comp.try_compress(&raw, &mut throttle)?;
    let elapsed = t0.elapsed();

    match stored {
        Some(block) => {
            fs::write(&output, &block)
                .with_context(|| format!("writing output file {:?}", output))?;
            eprintln!("  algorithm   : {} (level {})", algorithm, level);
            eprintln!("  raw size    : {}", human_bytes(raw.len() as u64));
            eprintln!("  stored      : {}", human_bytes(block.len() as u64));
            eprintln!("  ratio       : {:.2}x", raw.len() as f64 / block.len() as f64);
            eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
        }
        None => {
            // Admission rejection: the caller's contract is to keep the raw
            // bytes, so the output becomes a verbatim copy.
            fs::write(&output, &raw)
                .with_context(|| format!("writing output file {:?}", output))?;
            eprintln!(
                "  compression did not pay for {}; stored the raw bytes unchanged",
                human_bytes(raw.len() as u64)
            );
        }
    }
    Ok(())
}

fn run_decompress(input: PathBuf, output: PathBuf, algorithm: Algorithm) -> anyhow::Result<()> {
    let cfg = CompressionConfig {
        algorithm,
        ..Default::default()
    };
    let comp = compressor_for(&cache_label(&input), &cfg)?;

    let block = fs::read(&input).with_context(|| format!("reading block file {:?}", input))?;
    let t0 = Instant::now();
    let raw = comp.decompress(&block)?;
    let elapsed = t0.elapsed();

    fs::write(&output, &raw).with_context(|| format!("writing output file {:?}", output))?;
    eprintln!("  stored      : {}", human_bytes(block.len() as u64));
    eprintln!("  raw size    : {}", human_bytes(raw.len() as u64));
    eprintln!("  elapsed     : {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn run_inspect(file: PathBuf, algorithm: Algorithm) -> anyhow::Result<()> {
    let block = fs::read(&file).with_context(|| format!("reading block file {:?}", file))?;
    let header = *block
        .first()
        .ok_or_else(|| anyhow::anyhow!("block file {:?} is empty", file))?;

    println!("=== block {:?} ===", file);
    println!("  stored size    : {}", human_bytes(block.len() as u64));

    match algorithm {
        Algorithm::Lz4 => {
            println!("  header byte    : {:#04x}", header);
            println!("  ratio exponent : {}", header & 0x0F);
            let hint = hinted_buffer_len(header, block.len() - 1)?;
            println!("  decode buffer  : {}", human_bytes(hint as u64));
        }
        Algorithm::Zstd => {
            println!("  header byte    : {:#04x}", header);
            println!("  size class     : {} ({}x)", header >> 5, [4, 32, 256, 2048][(header >> 5) as usize & 3]);
            let dict = zstd_dict_slot(header);
            if dict == ZSTD_DICT_NONE {
                println!("  dictionary     : none");
            } else {
                println!("  dictionary     : slot {}", dict);
            }
            let hint = zstd_buffer_len(header, block.len())?;
            println!("  decode buffer  : {}", human_bytes(hint as u64));
        }
        Algorithm::Snappy => {
            println!("  header         : none (snappy blocks self-describe their length)");
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Compress {
            input,
            output,
            algorithm,
            level,
            self_check,
        } => run_compress(input, output, algorithm, level, self_check),
        Commands::Decompress {
            input,
            output,
            algorithm,
        } => run_decompress(input, output, algorithm),
        Commands::Inspect { file, algorithm } => run_inspect(file, algorithm),
    }
}
