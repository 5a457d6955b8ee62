//! # sensor-bench
//!
//! Benchmark harness that times one workload, "load a sensor CSV, keep rows
//! whose value is above a threshold, average them", on two consumers:
//!
//! - the in-process columnar engine ([`processor::ColumnarProcessor`]):
//!   memory-mapped loading, parallel parsing with Rayon, AVX2 filtering and
//!   aggregation with a scalar fallback;
//! - the `rust-cli` executable from `target/release`, run as a child process
//!   whose stdout is read back through [`extract`].
//!
//! ```no_run
//! use sensor_bench::{config::BenchmarkConfig, orchestrator, report};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BenchmarkConfig { row_count: 100_000, ..Default::default() };
//!     let report = orchestrator::run(config, Path::new("."), &mut std::io::stdout())?;
//!     print!("{}", report::render(&report));
//!     Ok(())
//! }
//! ```
//!
//! The engine needs the default `columnar-engine` feature. Without it the
//! harness can only benchmark an existing dataset and reports the baseline
//! as unavailable.

pub mod candidate;
pub mod cli;
pub mod config;
pub mod extract;
pub mod generator;
pub mod orchestrator;
pub mod processor;
pub mod report;
pub mod runner;

#[cfg(feature = "columnar-engine")]
mod helpers;
