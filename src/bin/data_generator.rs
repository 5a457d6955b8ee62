use anyhow::{Context, Result};
use clap::Parser;
use sensor_bench::{
    config::{DEFAULT_CSV, DEFAULT_ROWS, DEFAULT_SEED},
    generator,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Write the synthetic sensor dataset without benchmarking anything.
#[derive(Parser, Debug)]
#[command(name = "data_generator", version, about)]
struct Args {
    /// Rows to write
    #[arg(long, default_value_t = DEFAULT_ROWS)]
    rows: u64,

    /// Destination file, replaced if it exists
    #[arg(short, long, default_value = DEFAULT_CSV)]
    output: PathBuf,

    /// Generation seed
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let summary = generator::generate(&args.output, args.rows, args.seed)
        .with_context(|| format!("failed to generate '{}'", args.output.display()))?;

    println!(
        "Sample CSV generated: {} ({} rows, {:.1} MB, {:.2}s)",
        args.output.display(),
        summary.rows,
        summary.size_mb(),
        summary.elapsed_s
    );
    Ok(())
}
