//! Fixed constants of the benchmark and the per-run [`BenchmarkConfig`].

use serde::Serialize;
use std::path::PathBuf;

/// Default PRNG seed for dataset generation.
pub const DEFAULT_SEED: u64 = 42;

/// Default number of generated rows.
pub const DEFAULT_ROWS: u64 = 1_000_000;

/// Default filter threshold.
pub const DEFAULT_THRESHOLD: f64 = 50.0;

/// Default dataset location.
pub const DEFAULT_CSV: &str = "data.csv";

/// Number of sensor labels in the pool (`SENSOR_001` ..= `SENSOR_050`).
pub const SENSOR_COUNT: usize = 50;

/// Prefix of every sensor label.
pub const SENSOR_PREFIX: &str = "SENSOR_";

/// Timestamp of the first generated record: 2024-01-01T00:00:00Z.
pub const EPOCH_BASE: i64 = 1_704_067_200;

/// Timestamp layout used in the dataset.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Dataset header, in column order.
pub const CSV_HEADER: [&str; 3] = ["Timestamp", "SensorID", "Value"];

/// Column the workload filters and averages.
pub const VALUE_COLUMN: &str = "Value";

/// Accepted names of the external executable, tried in order.
pub const CANDIDATE_BINARY_NAMES: [&str; 2] = ["rust-cli", "rust_cli"];

/// Widest speed-up bar, in characters.
pub const SPEEDUP_BAR_MAX: usize = 60;

/// Settings for one harness run. Built once from the command line and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkConfig {
    pub row_count: u64,
    pub threshold: f64,
    pub dataset_path: PathBuf,
    pub skip_generation: bool,
    pub seed: u64,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            row_count: DEFAULT_ROWS,
            threshold: DEFAULT_THRESHOLD,
            dataset_path: PathBuf::from(DEFAULT_CSV),
            skip_generation: false,
            seed: DEFAULT_SEED,
        }
    }
}
