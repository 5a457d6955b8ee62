//! Drives one harness run: preconditions, generation, baseline, candidate.
//!
//! Phases run strictly one after another and share nothing but the dataset
//! file. Only the start-up preconditions and a failed generation abort the
//! run; a failing runner is recorded in the report and the other still runs.

use colored::Colorize;
use std::{
    fmt,
    io::Write,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    config::BenchmarkConfig,
    generator::{self, GenerateError},
    report::{BASELINE_NAME, BenchmarkReport, CANDIDATE_NAME, group_thousands},
    runner::{external, in_process},
};

/// Conditions that stop the harness before anything is benchmarked.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(
        "the in-process columnar engine is not part of this build; rebuild with \
         `--features columnar-engine` to generate and benchmark"
    )]
    EngineUnavailable,

    #[error("'{}' not found (required with --skip-generate)", .0.display())]
    MissingDataset(PathBuf),

    #[error("dataset generation failed: {0}")]
    Generation(#[from] GenerateError),
}

/// Checks the start-up preconditions without touching the filesystem
/// beyond an existence check.
pub fn check_preconditions(config: &BenchmarkConfig) -> Result<(), StartupError> {
    if config.skip_generation {
        if !config.dataset_path.is_file() {
            return Err(StartupError::MissingDataset(config.dataset_path.clone()));
        }
    } else if !in_process::is_available() {
        return Err(StartupError::EngineUnavailable);
    }
    Ok(())
}

/// Writes one piece of progress output. A closed or failing `out` never
/// aborts the run.
fn progress<W: Write>(out: &mut W, args: fmt::Arguments<'_>) {
    if let Err(err) = out.write_fmt(args).and_then(|()| out.flush()) {
        debug!(%err, "progress output dropped");
    }
}

/// Runs every phase and collects the results. Progress lines go to `out`.
///
/// `workspace` is where the candidate is looked up, under
/// `target/release`.
pub fn run<W: Write>(
    config: BenchmarkConfig,
    workspace: &Path,
    out: &mut W,
) -> Result<BenchmarkReport, StartupError> {
    check_preconditions(&config)?;

    let generation = if config.skip_generation {
        progress(
            out,
            format_args!("  Using existing CSV: {}\n", config.dataset_path.display()),
        );
        None
    } else {
        progress(out, format_args!("{}\n", "Step 1: Generating CSV".bold()));
        progress(
            out,
            format_args!(
                "  Writing {} rows to '{}' ... ",
                group_thousands(config.row_count),
                config.dataset_path.display()
            ),
        );
        let summary = generator::generate(&config.dataset_path, config.row_count, config.seed)?;
        progress(
            out,
            format_args!(
                "done  ({:.2}s, {:.1} MB)\n",
                summary.elapsed_s,
                summary.size_mb()
            ),
        );
        Some(summary)
    };

    progress(
        out,
        format_args!("\n{}\n", format!("Step 2: Running {BASELINE_NAME} ...").bold()),
    );
    let baseline = in_process::run(&config.dataset_path, config.threshold);
    info!(ok = baseline.is_ok(), "baseline finished");

    progress(
        out,
        format_args!("\n{}\n", format!("Step 3: Running {CANDIDATE_NAME} ...").bold()),
    );
    let candidate = external::run(&config.dataset_path, config.threshold, workspace);
    info!(ok = candidate.is_ok(), "candidate finished");

    Ok(BenchmarkReport::new(config, generation, baseline, candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::RunFailure;
    use std::io;

    /// Writer whose every write fails, like stdout piped into a closed reader.
    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
    }

    fn config(path: PathBuf, rows: u64, threshold: f64, skip: bool) -> BenchmarkConfig {
        BenchmarkConfig {
            row_count: rows,
            threshold,
            dataset_path: path,
            skip_generation: skip,
            ..BenchmarkConfig::default()
        }
    }

    #[test]
    fn test_missing_dataset_aborts_before_running() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.csv");
        let mut out = Vec::new();
        let err = run(config(missing.clone(), 10, 50.0, true), dir.path(), &mut out).unwrap_err();

        assert!(matches!(err, StartupError::MissingDataset(ref p) if *p == missing));
        assert!(out.is_empty());
        assert!(!missing.exists());
    }

    #[cfg(feature = "columnar-engine")]
    #[test]
    fn test_missing_binary_only_fails_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        let mut out = Vec::new();
        let report = run(config(path.clone(), 10, 1000.0, false), dir.path(), &mut out).unwrap();

        assert!(path.is_file());
        assert_eq!(report.generation.as_ref().map(|g| g.rows), Some(10));
        assert!(matches!(
            report.candidate,
            Err(RunFailure::BinaryNotFound { .. })
        ));
        assert_eq!(report.speedup(), None);

        let progress = String::from_utf8(out).unwrap();
        assert!(progress.contains("Writing 10 rows"));
        assert!(progress.contains("Step 3"));
    }

    #[cfg(feature = "columnar-engine")]
    #[test]
    fn test_baseline_with_nothing_above_threshold() {
        use crate::runner::Average;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        let report = run(config(path, 10, 1000.0, false), dir.path(), &mut io::sink()).unwrap();

        let baseline = report.baseline.as_ref().unwrap();
        assert_eq!(baseline.total_rows, Some(10));
        assert_eq!(baseline.filtered_rows, Some(0));
        assert_eq!(baseline.average, Some(Average::Undefined));
    }

    #[cfg(not(feature = "columnar-engine"))]
    #[test]
    fn test_generation_needs_engine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        let err = run(config(path.clone(), 10, 50.0, false), dir.path(), &mut io::sink()).unwrap_err();
        assert!(matches!(err, StartupError::EngineUnavailable));
        assert!(!path.exists());
    }

    #[test]
    fn test_closed_progress_output_does_not_abort() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        generator::generate(&path, 5, 7).unwrap();

        let report = run(config(path, 5, 50.0, true), dir.path(), &mut ClosedPipe).unwrap();
        assert!(matches!(
            report.candidate,
            Err(RunFailure::BinaryNotFound { .. })
        ));
    }

    #[cfg(feature = "columnar-engine")]
    #[test]
    fn test_closed_progress_output_during_generation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        let report = run(config(path.clone(), 20, 50.0, false), dir.path(), &mut ClosedPipe).unwrap();

        assert!(path.is_file());
        assert_eq!(report.baseline.as_ref().unwrap().total_rows, Some(20));
    }

    #[test]
    fn test_skip_generate_reuses_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        generator::generate(&path, 5, 7).unwrap();
        let before = std::fs::read(&path).unwrap();

        let mut out = Vec::new();
        let report = run(config(path.clone(), 999, 50.0, true), dir.path(), &mut out).unwrap();

        assert!(report.generation.is_none());
        assert_eq!(std::fs::read(&path).unwrap(), before);
        assert!(String::from_utf8(out).unwrap().contains("Using existing CSV"));
    }
}
