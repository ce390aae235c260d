use clap::{Parser, Subcommand};
use lzenvelope::attributes::{apply_from, capture_into, ExternalAttributes};
use lzenvelope::container::{decompress_file_with, inspect};
use lzenvelope::{container, LzmaEngine};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lzenv", about = "LZMA container and POSIX mode tool")]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file into an LZMA container
    Compress {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Decompress an LZMA container
    Decompress {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Decoder memory limit in MiB
        #[arg(long, value_parser = parse_memlimit)]
        memlimit: Option<usize>,
    },
    /// Show the container header
    Info {
        input: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Move POSIX modes in and out of external attributes
    #[command(subcommand)]
    Mode(ModeCommands),
}

#[derive(Subcommand)]
enum ModeCommands {
    /// Merge a file's mode into an external-attributes value
    Capture {
        path: PathBuf,
        /// Existing external attributes (hex, e.g. 0x0000ff00)
        #[arg(long, default_value = "0", value_parser = parse_attrs)]
        attrs: u32,
    },
    /// Apply the mode stored in an external-attributes value to a file
    Apply {
        path: PathBuf,
        #[arg(long, value_parser = parse_attrs)]
        attrs: u32,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {

        // ── Compress ─────────────────────────────────────────────────────────
        Commands::Compress { input, output } => {
            container::compress_file(&input, &output)?;
            println!("Compressed: {} → {}", input.display(), output.display());
        }

        // ── Decompress ───────────────────────────────────────────────────────
        Commands::Decompress { input, output, memlimit } => {
            let engine = match memlimit {
                Some(bytes) => LzmaEngine::new().with_memlimit(bytes),
                None        => LzmaEngine::new(),
            };
            decompress_file_with(&engine, &input, &output)?;
            println!("Decompressed: {} → {}", input.display(), output.display());
        }

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { input, json } => {
            let info = inspect(&mut BufReader::new(File::open(&input)?))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("── LZMA container ───────────────────────────────────────");
                println!("  Path              {}", input.display());
                println!("  Properties        {}", info.properties);
                println!("  Uncompressed size {} B", info.uncompressed_size);
                println!("  Payload size      {} B", info.payload_size);
                println!("  Header size       {} B", info.header_size);
            }
        }

        // ── Mode ─────────────────────────────────────────────────────────────
        Commands::Mode(ModeCommands::Capture { path, attrs }) => {
            let merged = capture_into(ExternalAttributes::from_raw(attrs), &path)?;
            println!("{:#010x}  (mode {:#o})", merged.raw(), merged.posix_mode());
        }
        Commands::Mode(ModeCommands::Apply { path, attrs }) => {
            let attrs = ExternalAttributes::from_raw(attrs);
            apply_from(attrs, &path)?;
            println!("Applied mode {:#o} to {}", attrs.posix_mode(), path.display());
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_attrs(s: &str) -> Result<u32, String> {
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    u32::from_str_radix(digits, 16).map_err(|e| format!("invalid attributes '{s}': {e}"))
}

/// `--memlimit` in MiB, converted to bytes.
fn parse_memlimit(s: &str) -> Result<usize, String> {
    let mib: usize = s.parse().map_err(|e| format!("invalid memlimit '{s}': {e}"))?;
    mib.checked_mul(1024 * 1024)
        .ok_or_else(|| format!("memlimit of {mib} MiB does not fit in memory addresses"))
}
