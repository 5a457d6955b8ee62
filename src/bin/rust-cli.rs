//! External candidate for the benchmark harness.
//!
//! Prints its metrics as labelled lines that the harness reads back.

use anyhow::{Context, Result, bail};
use clap::Parser;
use sensor_bench::{
    candidate::{self, SensorStats},
    extract::{AVERAGE_LABEL, FILTERED_ROWS_LABEL, NOT_AVAILABLE, TOTAL_ROWS_LABEL, WALL_CLOCK_LABEL},
};
use std::{io, path::PathBuf, time::Instant};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: jemallocator::Jemalloc = jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "rust-cli", version, about = "Filter and average a sensor CSV in parallel")]
struct Cli {
    /// CSV file with Timestamp, SensorID and Value columns
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Keep only rows whose Value is above this
    #[arg(short = 't', long, value_name = "FLOAT", default_value_t = 0.0)]
    filter_threshold: f64,

    /// Also print per-sensor counts and means
    #[arg(short, long)]
    verbose: bool,
}

fn print_sensor_table(stats: &[SensorStats]) {
    println!();
    println!("  {:<20} {:>10} {:>16}", "Sensor", "Rows", "Mean");
    println!("  {:-<20} {:->10} {:->16}", "", "", "");
    for s in stats {
        println!("  {:<20} {:>10} {:>16.6}", s.sensor_id, s.count, s.average);
    }
    println!();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    if !cli.input.exists() {
        bail!("input file '{}' does not exist", cli.input.display());
    }
    if !cli.input.is_file() {
        bail!("'{}' is not a regular file", cli.input.display());
    }

    println!("Input file      : {}", cli.input.display());
    println!("Filter threshold: {}", cli.filter_threshold);
    println!("Threads (rayon) : {}", rayon::current_num_threads());
    println!();

    let start = Instant::now();
    let records = candidate::read_records(&cli.input)
        .with_context(|| format!("failed to process '{}'", cli.input.display()))?;
    let stats = candidate::process(&records, cli.filter_threshold, cli.verbose);
    let elapsed = start.elapsed();
    debug!(rows = stats.total_rows, ?elapsed, "workload finished");

    if cli.verbose && !stats.per_sensor.is_empty() {
        print_sensor_table(&stats.per_sensor);
    }

    println!("Processing complete");
    println!("    {TOTAL_ROWS_LABEL:<21}: {}", stats.total_rows);
    println!("    {FILTERED_ROWS_LABEL:<21}: {}", stats.filtered_rows);
    println!(
        "    {:<21}: {} ({:.2}%)",
        "Rows removed",
        stats.removed_rows(),
        stats.removed_percent()
    );
    match stats.average {
        Some(avg) => println!("    {AVERAGE_LABEL:<21}: {avg:.6}"),
        None => println!("    {AVERAGE_LABEL:<21}: {NOT_AVAILABLE} (no rows passed the filter)"),
    }
    println!("{WALL_CLOCK_LABEL:<16}: {elapsed:.4?}");

    Ok(())
}
