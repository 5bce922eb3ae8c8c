//! Command-line interface for dynproto
//!
//! # Usage Examples
//!
//! ```bash
//! # JSON (stdin) → protobuf (stdout)
//! echo '{"countries": [{"name": "A", "code": 1}]}' \
//!   | dynproto encode --proto example.proto --message CountryList > countries.bin
//!
//! # protobuf → JSON
//! dynproto decode --proto example.proto --message CountryList --input countries.bin --pretty
//!
//! # A stream of JSON values → length-delimited frames, and back
//! dynproto encode --proto example.proto --message Country --delimited \
//!   --input countries.jsonl --output countries.frames
//! dynproto decode --proto example.proto --message Country --delimited \
//!   --input countries.frames
//!
//! # Show the resolved message layout
//! dynproto inspect --proto example.proto --message CountryList
//!
//! # Schemas that import by root-relative path (import "example/v1/region.proto")
//! dynproto inspect -I protos --proto protos/example/v1/example.proto --message Country
//! ```
//!
//! Imports resolve against the schema's directory, each `-I` root, then the
//! working directory. `--proto` and `--message` fall back to `DYNPROTO_PROTO`
//! and `DYNPROTO_MESSAGE`; `RUST_LOG` controls diagnostics on stderr.

use anyhow::Context;
use clap::{Parser, Subcommand};
use dynproto::{CodecOpts, MapperOptions, ProtoFile};
use serde_json::Value;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Parser)]
#[command(name = "dynproto")]
#[command(about = "Encode and decode protobuf messages using a .proto schema loaded at runtime")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert JSON into protobuf binary
    Encode {
        #[command(flatten)]
        codec: CodecOpts,

        /// JSON input file (default: stdin)
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Binary output file (default: stdout)
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Write each JSON value in the input as a length-prefixed frame
        #[arg(long)]
        delimited: bool,

        /// Reject JSON keys that do not name a field
        #[arg(long, env = "DYNPROTO_STRICT")]
        strict: bool,
    },

    /// Convert protobuf binary into JSON
    Decode {
        #[command(flatten)]
        codec: CodecOpts,

        /// Binary input file (default: stdin)
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Read consecutive length-prefixed frames, printing one JSON value per line
        #[arg(long)]
        delimited: bool,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the resolved layout of a message type
    Inspect {
        #[command(flatten)]
        codec: CodecOpts,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Encode {
            codec,
            input,
            output,
            delimited,
            strict,
        } => {
            let file = open(&codec)?.with_options(MapperOptions {
                reject_unknown_fields: strict,
            });
            let data = read_input(input.as_deref())?;

            let encoded = if delimited {
                let mut frames = Vec::new();
                for (index, value) in serde_json::Deserializer::from_slice(&data)
                    .into_iter::<Value>()
                    .enumerate()
                {
                    let value = value.with_context(|| format!("Invalid JSON value #{index}"))?;
                    let frame = file
                        .encode_delimited(&value)
                        .with_context(|| format!("Failed to encode value #{index}"))?;
                    frames.extend_from_slice(&frame);
                }
                frames
            } else {
                let value: Value = serde_json::from_slice(&data).context("Invalid JSON input")?;
                file.encode(&value)
                    .with_context(|| format!("Failed to encode {}", file.message_name()))?
            };

            debug!("Writing {} bytes", encoded.len());
            write_output(output.as_deref(), &encoded)
        }
        Commands::Decode {
            codec,
            input,
            delimited,
            pretty,
        } => {
            let file = open(&codec)?;
            let data = read_input(input.as_deref())?;

            let values = if delimited {
                let mut values = Vec::new();
                let mut offset = 0;
                while offset < data.len() {
                    let (value, consumed) = file
                        .decode_delimited_prefix(&data[offset..])
                        .with_context(|| format!("Failed to decode frame at byte {offset}"))?;
                    values.push(value);
                    offset += consumed;
                }
                values
            } else {
                vec![file
                    .decode(&data)
                    .with_context(|| format!("Failed to decode {}", file.message_name()))?]
            };

            let mut stdout = std::io::stdout().lock();
            for value in values {
                let text = if pretty {
                    serde_json::to_string_pretty(&value)?
                } else {
                    serde_json::to_string(&value)?
                };
                writeln!(stdout, "{text}")?;
            }
            Ok(())
        }
        Commands::Inspect { codec } => {
            let file = open(&codec)?;
            print!("{}", file.describe());
            Ok(())
        }
    }
}

fn open(codec: &CodecOpts) -> anyhow::Result<ProtoFile> {
    codec.open().with_context(|| {
        format!(
            "Failed to load message {} from {:?}",
            codec.message, codec.proto
        )
    })
}

fn read_input(path: Option<&Path>) -> anyhow::Result<Vec<u8>> {
    match path {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("Failed to read input file {path:?}"))
        }
        None => {
            let mut data = Vec::new();
            std::io::stdin()
                .read_to_end(&mut data)
                .context("Failed to read stdin")?;
            Ok(data)
        }
    }
}

fn write_output(path: Option<&Path>, data: &[u8]) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, data).with_context(|| format!("Failed to write {path:?}"))
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(data).context("Failed to write stdout")?;
            stdout.flush().context("Failed to flush stdout")
        }
    }
}
