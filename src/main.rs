use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use otns::parse::ReadParser;
use otns::{config::DEFAULT_MAX_DEPTH, DecodeConfig, Value, ValueIter};

#[derive(ClapParser)]
#[command(name = "otns", version, about = "Ordered tnetstring inspection and conversion")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every value in an ordered tnetstring stream, one per line
    Decode {
        /// Input file (standard input if omitted)
        path: Option<PathBuf>,
        /// Maximum container nesting depth
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },
    /// Convert a stream of JSON values into ordered tnetstrings
    Encode {
        /// Input file (standard input if omitted)
        path: Option<PathBuf>,
    },
}

fn open(path: Option<&PathBuf>) -> Result<Box<dyn Read>> {
    Ok(match path {
        Some(path) => Box::new(
            File::open(path).with_context(|| format!("cannot open {}", path.display()))?,
        ),
        None => Box::new(io::stdin().lock()),
    })
}

fn decode(path: Option<PathBuf>, max_depth: usize) -> Result<()> {
    let reader = BufReader::new(open(path.as_ref())?);
    let config = DecodeConfig::default().with_max_depth(max_depth);
    let mut out = BufWriter::new(io::stdout().lock());

    let mut count = 0usize;
    for value in ValueIter::with_config(ReadParser::new(reader), config) {
        let value = value.with_context(|| format!("failed to decode value #{}", count + 1))?;
        writeln!(out, "{}", value)?;
        count += 1;
    }
    out.flush()?;
    info!(count, "decoded values");
    Ok(())
}

fn encode(path: Option<PathBuf>) -> Result<()> {
    let reader = BufReader::new(open(path.as_ref())?);
    let mut out = BufWriter::new(io::stdout().lock());

    let mut count = 0usize;
    for value in serde_json::Deserializer::from_reader(reader).into_iter::<Value>() {
        let value = value.with_context(|| format!("invalid JSON value #{}", count + 1))?;
        debug!(tag = %value.tag(), "encoding value");
        otns::encode_to_writer(&value, &mut out)?;
        count += 1;
    }
    out.flush()?;
    info!(count, "encoded values");
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Decode { path, max_depth } => decode(path, max_depth),
        Commands::Encode { path } => encode(path),
    }
}
