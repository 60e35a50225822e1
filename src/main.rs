use std::fs::{self, File, OpenOptions};
use std::process;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use memmap2::MmapMut;
use tracing_subscriber::EnvFilter;

use vcdelta::{
    decode_tokens, delta_summary, encode_tokens, from_json, is_binary_delta, to_json, Codec,
    CodecOptions, Token,
};

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Read a UTF-8 text file or exit.
fn read_text(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", path, e);
        process::exit(1);
    })
}

/// Parse either delta format; binary deltas also carry the target length.
fn load_tokens(path: &str, data: &[u8]) -> (Vec<Token>, Option<usize>, DeltaFormat) {
    if is_binary_delta(data) {
        let (tokens, target_len) = decode_tokens(data).unwrap_or_else(|e| {
            eprintln!("Error decoding {}: {}", path, e);
            process::exit(1);
        });
        return (tokens, Some(target_len), DeltaFormat::Binary);
    }
    let text = std::str::from_utf8(data).unwrap_or_else(|_| {
        eprintln!("Error decoding {}: not a delta file", path);
        process::exit(1);
    });
    let tokens = from_json(text).unwrap_or_else(|e| {
        eprintln!("Error decoding {}: {}", path, e);
        process::exit(1);
    });
    (tokens, None, DeltaFormat::Json)
}

// ── mmap helpers ─────────────────────────────────────────────────────────

/// Create a file of `size` bytes and memory-map it for read-write.
/// Returns `None` for size 0 (creates an empty file).
fn mmap_create(path: &str, size: usize) -> std::io::Result<(File, Option<MmapMut>)> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    if size > 0 {
        file.set_len(size as u64)?;
        // SAFETY: We have exclusive access to this newly-created file.
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        Ok((file, Some(mmap)))
    } else {
        Ok((file, None))
    }
}

// ── CLI types ────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DeltaFormat {
    Binary,
    Json,
}

#[derive(Parser)]
#[command(about = "Block-matching text delta codec")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the delta of a target text against a dictionary text
    Encode {
        /// Dictionary (reference) file
        dictionary: String,

        /// Target file
        target: String,

        /// Output delta file
        delta_file: String,

        /// Block size in chars (must be >= 1)
        #[arg(long, default_value_t = vcdelta::DEFAULT_BLOCK_SIZE,
              value_parser = |s: &str| s.parse::<usize>()
                  .map_err(|e| e.to_string())
                  .and_then(|n| if n >= 1 { Ok(n) }
                            else { Err("--block-size must be >= 1".to_string()) }))]
        block_size: usize,

        /// Rolling hash base
        #[arg(long, default_value_t = vcdelta::HASH_BASE)]
        prime_base: u64,

        /// Rolling hash modulus
        #[arg(long, default_value_t = vcdelta::HASH_MOD)]
        prime_modulus: u64,

        /// Delta file format
        #[arg(long, value_enum, default_value_t = DeltaFormat::Binary)]
        format: DeltaFormat,

        /// Print diagnostic messages to stderr
        #[arg(long)]
        verbose: bool,
    },

    /// Reconstruct the target from a dictionary and a delta
    Decode {
        /// Dictionary (reference) file
        dictionary: String,

        /// Delta file (binary or JSON)
        delta_file: String,

        /// Output (reconstructed target) file
        output: String,

        /// Print diagnostic messages to stderr
        #[arg(long)]
        verbose: bool,
    },

    /// Show delta file statistics
    Info {
        /// Delta file
        delta_file: String,
    },
}

// ── main ─────────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Encode {
            dictionary,
            target,
            delta_file,
            block_size,
            prime_base,
            prime_modulus,
            format,
            verbose,
        } => {
            init_logging(verbose);
            let d = read_text(&dictionary);
            let t = read_text(&target);

            let opts = CodecOptions {
                block_size,
                prime_base,
                prime_modulus,
            };
            let mut codec = Codec::with_options(&opts).unwrap_or_else(|e| {
                eprintln!("Error: {}", e);
                process::exit(1);
            });

            let t0 = Instant::now();
            let tokens = codec.encode(&d, &t);
            let elapsed = t0.elapsed();

            let target_len = t.chars().count();
            let delta_bytes = match format {
                DeltaFormat::Binary => encode_tokens(&tokens, target_len),
                DeltaFormat::Json => to_json(&tokens).map(String::into_bytes),
            }
            .unwrap_or_else(|e| {
                eprintln!("Error encoding delta: {}", e);
                process::exit(1);
            });
            fs::write(&delta_file, &delta_bytes).unwrap_or_else(|e| {
                eprintln!("Error writing {}: {}", delta_file, e);
                process::exit(1);
            });

            let stats = delta_summary(&tokens);
            let ratio = if t.is_empty() {
                0.0
            } else {
                delta_bytes.len() as f64 / t.len() as f64
            };
            println!("Block size:   {}", block_size);
            println!("Dictionary:   {} ({} chars)", dictionary, d.chars().count());
            println!("Target:       {} ({} chars)", target, target_len);
            println!("Delta:        {} ({} bytes, {:?})", delta_file, delta_bytes.len(), format);
            println!("Compression:  {:.4} (delta bytes/target bytes)", ratio);
            println!(
                "Tokens:       {} copies, {} literals",
                stats.num_copies, stats.num_literals
            );
            println!("Copy chars:   {}", stats.copy_chars);
            println!("Literal chars: {}", stats.literal_chars);
            println!("Time:         {:.3}s", elapsed.as_secs_f64());
        }

        Commands::Decode {
            dictionary,
            delta_file,
            output,
            verbose,
        } => {
            init_logging(verbose);
            let d = read_text(&dictionary);
            let delta_bytes = fs::read(&delta_file).unwrap_or_else(|e| {
                eprintln!("Error reading {}: {}", delta_file, e);
                process::exit(1);
            });

            let t0 = Instant::now();
            let (tokens, target_len, format) = load_tokens(&delta_file, &delta_bytes);
            let codec = Codec::new();
            let text = codec.decode(&d, &tokens).unwrap_or_else(|e| {
                eprintln!("Error applying delta: {}", e);
                process::exit(1);
            });

            let out_len = text.chars().count();
            if let Some(expected) = target_len {
                if expected != out_len {
                    eprintln!(
                        "error: output length mismatch: expected {} chars, got {}",
                        expected, out_len
                    );
                    process::exit(1);
                }
            }

            let (_out_file, out_mmap) = mmap_create(&output, text.len()).unwrap_or_else(|e| {
                eprintln!("Error creating {}: {}", output, e);
                process::exit(1);
            });
            if let Some(mut mm) = out_mmap {
                mm.copy_from_slice(text.as_bytes());
                mm.flush().unwrap_or_else(|e| {
                    eprintln!("Error flushing {}: {}", output, e);
                    process::exit(1);
                });
            }
            let elapsed = t0.elapsed();

            println!("Format:       {:?}", format);
            println!("Dictionary:   {} ({} chars)", dictionary, d.chars().count());
            println!("Delta:        {} ({} bytes)", delta_file, delta_bytes.len());
            println!("Output:       {} ({} chars)", output, out_len);
            println!("Time:         {:.3}s", elapsed.as_secs_f64());
        }

        Commands::Info { delta_file } => {
            let delta_bytes = fs::read(&delta_file).unwrap_or_else(|e| {
                eprintln!("Error reading {}: {}", delta_file, e);
                process::exit(1);
            });
            let (tokens, target_len, format) = load_tokens(&delta_file, &delta_bytes);

            let stats = delta_summary(&tokens);
            println!("Delta file:   {} ({} bytes)", delta_file, delta_bytes.len());
            println!("Format:       {:?}", format);
            if let Some(n) = target_len {
                println!("Target size:  {} chars", n);
            }
            if tokens.is_empty() {
                println!("Tokens:       0 (target equals dictionary)");
                return;
            }
            println!("Tokens:       {}", stats.num_tokens);
            println!(
                "  Copies:     {} ({} chars)",
                stats.num_copies, stats.copy_chars
            );
            println!(
                "  Literals:   {} ({} chars)",
                stats.num_literals, stats.literal_chars
            );
            println!("Output size:  {} chars", stats.total_output_chars);
        }
    }
}
