//! Baseline runner: the workload on the in-process columnar engine.

use std::path::Path;

use crate::runner::{RunFailure, RunOutcome};

/// Whether this build carries the columnar engine. Checked once at start-up
/// before anything is timed.
pub fn is_available() -> bool {
    cfg!(feature = "columnar-engine")
}

/// Loads `path`, keeps rows whose value is strictly above `threshold` and
/// averages them, timing each phase.
///
/// `total_s` spans the whole load-to-average interval, so it also covers the
/// gaps between phases and is never smaller than their sum.
#[cfg(feature = "columnar-engine")]
pub fn run(path: &Path, threshold: f64) -> RunOutcome {
    use std::time::Instant;
    use tracing::debug;

    use crate::{
        config::VALUE_COLUMN,
        processor::ColumnarProcessor,
        runner::{Average, Phase, PhaseTiming, RunResult},
    };

    let engine_err = |source| RunFailure::Engine {
        path: path.to_path_buf(),
        source,
    };

    let t_start = Instant::now();
    let mut processor = ColumnarProcessor::new();
    let summary = processor.load_csv(path).map_err(engine_err)?;
    let t_read = Instant::now();

    if let Some(first) = summary.errors.first() {
        return Err(RunFailure::MalformedDataset {
            path: path.to_path_buf(),
            count: summary.errors.len(),
            line: first.line,
            detail: format!("{} ({})", first.error, first.value),
        });
    }
    let total_rows = processor.row_count() as u64;

    let rows = processor
        .filter_greater_than(VALUE_COLUMN, threshold)
        .map_err(engine_err)?;
    let t_filter = Instant::now();
    let filtered_rows = rows.len() as u64;

    let average = if rows.is_empty() {
        Average::Undefined
    } else {
        let mean = processor
            .average_rows(VALUE_COLUMN, &rows)
            .map_err(engine_err)?;
        Average::Mean(mean)
    };
    let t_avg = Instant::now();

    let phases = vec![
        PhaseTiming {
            phase: Phase::Read,
            seconds: (t_read - t_start).as_secs_f64(),
        },
        PhaseTiming {
            phase: Phase::Filter,
            seconds: (t_filter - t_read).as_secs_f64(),
        },
        PhaseTiming {
            phase: Phase::Average,
            seconds: (t_avg - t_filter).as_secs_f64(),
        },
    ];
    debug!(?phases, total_rows, filtered_rows, "in-process run finished");

    Ok(RunResult {
        total_rows: Some(total_rows),
        filtered_rows: Some(filtered_rows),
        average: Some(average),
        phases,
        reported_wall_clock: None,
        total_s: (t_avg - t_start).as_secs_f64(),
    })
}

#[cfg(not(feature = "columnar-engine"))]
pub fn run(_path: &Path, _threshold: f64) -> RunOutcome {
    Err(RunFailure::EngineUnavailable)
}
