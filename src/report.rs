//! Side-by-side report of the baseline and candidate runs.
//!
//! The terminal rendering always shows both blocks; a failed run shows its
//! message instead of metrics. Speed-up is only computed when both runs
//! completed.

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use std::{fmt::Write as _, fs, io, path::Path};

use crate::{
    config::{BenchmarkConfig, SPEEDUP_BAR_MAX},
    generator::GenerationSummary,
    runner::{Average, RunOutcome, RunResult},
};

pub const BASELINE_NAME: &str = "Columnar engine (in-process)";
pub const CANDIDATE_NAME: &str = "rust-cli (external process)";

const RULE_WIDTH: usize = 62;
const NOT_AVAILABLE: &str = "N/A";

/// Everything one harness run produced.
#[derive(Debug)]
pub struct BenchmarkReport {
    pub config: BenchmarkConfig,
    pub generation: Option<GenerationSummary>,
    pub baseline: RunOutcome,
    pub candidate: RunOutcome,
    pub finished_at: DateTime<Utc>,
}

impl BenchmarkReport {
    pub fn new(
        config: BenchmarkConfig,
        generation: Option<GenerationSummary>,
        baseline: RunOutcome,
        candidate: RunOutcome,
    ) -> Self {
        Self {
            config,
            generation,
            baseline,
            candidate,
            finished_at: Utc::now(),
        }
    }

    pub fn speedup(&self) -> Option<f64> {
        speedup(&self.baseline, &self.candidate)
    }
}

/// `baseline_total_s / candidate_total_s`, or `None` unless both runs
/// completed with a measurable candidate time. Values above 1 mean the
/// candidate was faster.
pub fn speedup(baseline: &RunOutcome, candidate: &RunOutcome) -> Option<f64> {
    match (baseline, candidate) {
        (Ok(b), Ok(c)) if c.total_s > 0.0 => Some(b.total_s / c.total_s),
        _ => None,
    }
}

/// One block character per whole unit of speed-up, capped at
/// [`SPEEDUP_BAR_MAX`].
pub fn speedup_bar(speedup: f64) -> String {
    let len = if speedup.is_finite() && speedup > 0.0 {
        (speedup.floor() as usize).min(SPEEDUP_BAR_MAX)
    } else {
        0
    };
    "█".repeat(len)
}

/// Formats `n` with `,` every three digits.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn count_cell(n: Option<u64>) -> String {
    n.map_or_else(|| NOT_AVAILABLE.to_string(), group_thousands)
}

fn average_cell(avg: Option<Average>) -> String {
    match avg.and_then(Average::value) {
        Some(v) => format!("{v:.6}"),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn render_metrics(out: &mut String, result: &RunResult) {
    let _ = writeln!(out, "  Total rows       : {:>12}", count_cell(result.total_rows));
    let _ = writeln!(out, "  Filtered rows    : {:>12}", count_cell(result.filtered_rows));
    let _ = writeln!(out, "  Average value    : {:>16}", average_cell(result.average));
    for timing in &result.phases {
        let _ = writeln!(out, "  {:<16} : {:>12.4} s", timing.phase.label(), timing.seconds);
    }
    if let Some(wall) = &result.reported_wall_clock {
        let _ = writeln!(out, "  Internal time    : {wall:>16}");
    }
    let total = format!("{:>12.4} s", result.total_s);
    let _ = writeln!(out, "  {}       : {}", "Total time".bold(), total.bold());
}

fn render_outcome(out: &mut String, outcome: &RunOutcome) {
    match outcome {
        Ok(result) => render_metrics(out, result),
        Err(failure) => {
            let _ = writeln!(out, "  {}", failure.to_string().yellow());
        }
    }
}

/// Renders the report for the terminal.
pub fn render(report: &BenchmarkReport) -> String {
    let mut out = String::new();
    let heavy = "═".repeat(RULE_WIDTH);

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", heavy.bold());
    let _ = writeln!(out, "{}", "  BENCHMARK RESULTS".bold());
    let _ = writeln!(out, "{}", heavy.bold());
    let _ = writeln!(
        out,
        "  Row count      : {:>12}",
        group_thousands(report.config.row_count)
    );
    let _ = writeln!(out, "  Threshold      : {:>12.2}", report.config.threshold);
    let _ = writeln!(out, "{}", "─".repeat(RULE_WIDTH).bold());

    let _ = writeln!(out, "\n  {}", format!("[{BASELINE_NAME}]").cyan().bold());
    render_outcome(&mut out, &report.baseline);

    let _ = writeln!(out, "\n  {}", format!("[{CANDIDATE_NAME}]").green().bold());
    render_outcome(&mut out, &report.candidate);

    let _ = writeln!(out, "\n  {}", "[Speed-up]".bold());
    match report.speedup() {
        Some(s) => {
            let verdict = if s >= 1.0 { "faster" } else { "slower" };
            let factor = if s >= 1.0 { s } else { 1.0 / s };
            let _ = writeln!(
                out,
                "  rust-cli is {} {verdict} than the columnar engine",
                format!("{factor:.2}×").green().bold()
            );
            let _ = writeln!(out, "  {}", speedup_bar(s).green());
        }
        None if report.baseline.is_ok() && report.candidate.is_ok() => {
            let _ = writeln!(out, "  (Cannot compute: candidate time too small to measure)");
        }
        None => {
            let _ = writeln!(out, "  (Cannot compute: one or both runs failed)");
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", heavy.bold());
    out
}

#[derive(Serialize)]
#[serde(untagged)]
enum RunSection<'a> {
    Completed(&'a RunResult),
    Failed { error: String },
}

impl<'a> From<&'a RunOutcome> for RunSection<'a> {
    fn from(outcome: &'a RunOutcome) -> Self {
        match outcome {
            Ok(result) => RunSection::Completed(result),
            Err(failure) => RunSection::Failed {
                error: failure.to_string(),
            },
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    config: &'a BenchmarkConfig,
    generation: Option<&'a GenerationSummary>,
    baseline: RunSection<'a>,
    candidate: RunSection<'a>,
    speedup: Option<f64>,
    finished_at: DateTime<Utc>,
}

/// Pretty JSON form of the report.
pub fn to_json(report: &BenchmarkReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport {
        config: &report.config,
        generation: report.generation.as_ref(),
        baseline: (&report.baseline).into(),
        candidate: (&report.candidate).into(),
        speedup: report.speedup(),
        finished_at: report.finished_at,
    })
}

/// Write the report as JSON to `path`.
pub fn write_json(report: &BenchmarkReport, path: impl AsRef<Path>) -> io::Result<()> {
    let json = to_json(report).map_err(io::Error::other)?;
    fs::write(path, json)
}
