//! Timed workload runners and their shared result types.
//!
//! Both runners execute the same workload, load the dataset, keep rows whose
//! value exceeds the threshold, and average them. Each returns a
//! [`RunOutcome`]: a [`RunResult`] on success or a [`RunFailure`] describing
//! why the run could not complete. A failure only affects its own runner.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::{extract::ExtractError, processor::ProcessorError};

pub mod external;
pub mod in_process;

/// Mean of the filtered values, or the sentinel for "no rows passed".
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Average {
    Mean(f64),
    /// Nothing to average. Distinct from a mean of zero.
    Undefined,
}

impl Average {
    pub fn value(self) -> Option<f64> {
        match self {
            Average::Mean(v) => Some(v),
            Average::Undefined => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Read,
    Filter,
    Average,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Read => "Read time",
            Phase::Filter => "Filter time",
            Phase::Average => "Avg compute time",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhaseTiming {
    pub phase: Phase,
    pub seconds: f64,
}

/// Metrics of one completed run.
///
/// Counts and average are optional because the external process may omit a
/// label; the in-process runner always fills them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub total_rows: Option<u64>,
    pub filtered_rows: Option<u64>,
    pub average: Option<Average>,
    pub phases: Vec<PhaseTiming>,
    /// Timing the external process reported about itself, display only.
    pub reported_wall_clock: Option<String>,
    /// Authoritative wall-clock seconds used for the comparison.
    pub total_s: f64,
}

/// Why a runner produced no [`RunResult`].
#[derive(Debug, Error)]
pub enum RunFailure {
    #[error(
        "in-process engine not available: this build lacks the `columnar-engine` feature \
         (rebuild with `--features columnar-engine`)"
    )]
    EngineUnavailable,

    #[error("columnar engine failed on '{path}': {source}")]
    Engine {
        path: PathBuf,
        source: ProcessorError,
    },

    #[error("'{path}' has {count} malformed line(s); first at line {line}: {detail}")]
    MalformedDataset {
        path: PathBuf,
        count: usize,
        line: usize,
        detail: String,
    },

    #[error(
        "external binary not found, run `cargo build --release` first.\n  Looked in: {}",
        .searched.display()
    )]
    BinaryNotFound { searched: PathBuf },

    #[error("failed to launch '{}': {source}", .binary.display())]
    Spawn {
        binary: PathBuf,
        source: std::io::Error,
    },

    #[error("external process exited with code {code}:\n{stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("external process was terminated by a signal:\n{stderr}")]
    Terminated { stderr: String },

    #[error("could not read external process output: {0}")]
    Extract(#[from] ExtractError),
}

pub type RunOutcome = Result<RunResult, RunFailure>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_sentinel() {
        assert_eq!(Average::Mean(2.5).value(), Some(2.5));
        assert_eq!(Average::Undefined.value(), None);
        assert_ne!(Average::Mean(0.0), Average::Undefined);
    }

    #[test]
    fn test_average_serializes_sentinel_as_null() {
        assert_eq!(serde_json::to_string(&Average::Undefined).unwrap(), "null");
        assert_eq!(serde_json::to_string(&Average::Mean(1.5)).unwrap(), "1.5");
    }

    #[test]
    fn test_binary_not_found_message_has_build_hint() {
        let msg = RunFailure::BinaryNotFound {
            searched: PathBuf::from("/ws/target/release"),
        }
        .to_string();
        assert!(msg.contains("cargo build --release"));
        assert!(msg.contains("/ws/target/release"));
    }
}
