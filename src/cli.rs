//! Command line of the `sensor-bench` harness.

use clap::Parser;
use std::path::PathBuf;

use crate::config::{BenchmarkConfig, DEFAULT_CSV, DEFAULT_ROWS, DEFAULT_SEED, DEFAULT_THRESHOLD};

/// Compare the in-process columnar engine with the `rust-cli` executable on a
/// synthetic sensor CSV.
#[derive(Parser, Debug)]
#[command(name = "sensor-bench", version, about, long_about = None)]
pub struct Cli {
    /// Rows to generate
    #[arg(long, env = "SENSOR_BENCH_ROWS", default_value_t = DEFAULT_ROWS,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub rows: u64,

    /// Keep only rows whose value is strictly above this
    #[arg(long, env = "SENSOR_BENCH_THRESHOLD", default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,

    /// Dataset path
    #[arg(long, env = "SENSOR_BENCH_CSV", default_value = DEFAULT_CSV)]
    pub csv: PathBuf,

    /// Reuse the existing dataset instead of generating one
    #[arg(long)]
    pub skip_generate: bool,

    /// Seed for dataset generation
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Directory whose `target/release` holds the rust-cli executable
    #[arg(long, env = "SENSOR_BENCH_WORKSPACE", default_value = env!("CARGO_MANIFEST_DIR"))]
    pub workspace: PathBuf,

    /// Also write the report as JSON to this file
    #[arg(long, value_name = "FILE")]
    pub json: Option<PathBuf>,

    /// Debug-level diagnostics on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn to_config(&self) -> BenchmarkConfig {
        BenchmarkConfig {
            row_count: self.rows,
            threshold: self.threshold,
            dataset_path: self.csv.clone(),
            skip_generation: self.skip_generate,
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["sensor-bench"]).unwrap();
        assert_eq!(cli.to_config(), BenchmarkConfig::default());
        assert!(cli.json.is_none());
        assert_eq!(cli.workspace, PathBuf::from(env!("CARGO_MANIFEST_DIR")));
    }

    #[test]
    fn test_all_flags() {
        let cli = Cli::try_parse_from([
            "sensor-bench",
            "--rows",
            "10",
            "--threshold",
            "1000",
            "--csv",
            "/tmp/x.csv",
            "--skip-generate",
            "--seed",
            "7",
            "--json",
            "out.json",
        ])
        .unwrap();
        let config = cli.to_config();
        assert_eq!(config.row_count, 10);
        assert_eq!(config.threshold, 1000.0);
        assert_eq!(config.dataset_path, PathBuf::from("/tmp/x.csv"));
        assert!(config.skip_generation);
        assert_eq!(config.seed, 7);
        assert_eq!(cli.json, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_zero_rows_rejected() {
        assert!(Cli::try_parse_from(["sensor-bench", "--rows", "0"]).is_err());
    }

    #[test]
    fn test_bad_threshold_rejected() {
        assert!(Cli::try_parse_from(["sensor-bench", "--threshold", "high"]).is_err());
    }
}
