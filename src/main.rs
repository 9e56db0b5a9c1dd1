use anyhow::{Context, Result};
use clap::Parser;
use csvbind::{Reader, ReaderConfig};
use std::{
    io::{self, BufWriter, Write},
    path::PathBuf,
    time::Instant,
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Decode a delimited file with a YAML layout and print one JSON object per record.
#[derive(Debug, Parser)]
#[command(name = "csvbind", version)]
struct Args {
    /// Reader config (delimiter, limit, layout) in YAML
    #[arg(short, long)]
    config: PathBuf,

    /// Input file; the first row is the header
    file: PathBuf,

    /// Override the config's row limit
    #[arg(short, long)]
    limit: Option<usize>,

    /// Override the config's delimiter
    #[arg(short, long)]
    delimiter: Option<char>,
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();

    // ─── 2) load config ──────────────────────────────────────────────
    let args = Args::parse();
    let mut config = ReaderConfig::load(&args.config)?;
    if let Some(limit) = args.limit {
        config.limit = Some(limit);
    }
    if let Some(d) = args.delimiter {
        anyhow::ensure!(d.is_ascii(), "delimiter {:?} must be ASCII", d);
        config.delimiter = d as u8;
    }
    let layout = config
        .layout
        .clone()
        .with_context(|| format!("{:?} has no `layout` section", args.config))?;

    // ─── 3) decode ───────────────────────────────────────────────────
    let start = Instant::now();
    let mut reader = Reader::from_path_with_config(&args.file, &config)?;
    let records = reader
        .read_dynamic(&layout)
        .with_context(|| format!("decoding {:?}", args.file))?;
    info!(rows = records.len(), elapsed = ?start.elapsed(), "decoded");

    // ─── 4) emit JSON lines ──────────────────────────────────────────
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for record in &records {
        serde_json::to_writer(&mut out, record)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;

    Ok(())
}
