//! In-process columnar CSV engine used as the benchmark baseline.
//!
//! The engine memory-maps the file, parses it in parallel into chunked
//! columns, and exposes the two primitives the workload needs: a threshold
//! filter and an average over the selected rows. The shared types below are
//! always available; the engine itself needs the `columnar-engine` feature.

use thiserror::Error;

#[cfg(feature = "columnar-engine")]
pub mod column;
#[cfg(feature = "columnar-engine")]
pub mod columnar_processor;

#[cfg(feature = "columnar-engine")]
pub use columnar_processor::ColumnarProcessor;

/// Error type used across the engine
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Schema/parse error: {0}")]
    Parse(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Column '{column}' is not numeric")]
    NotNumeric { column: String },

    #[error("Row {row} is out of range ({rows} rows loaded)")]
    RowOutOfRange { row: usize, rows: usize },

    #[error("Cannot aggregate an empty selection")]
    EmptySelection,
}

/// Outcome of [`ColumnarProcessor::load_csv`].
#[derive(Debug, Default)]
pub struct ParseSummary {
    pub rows_processed: usize,
    pub errors: Vec<ParseError>,
}

/// A data line that could not be loaded. `line` is 1-based and counts the
/// header.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub line: usize,
    pub column: String,
    pub value: String,
    pub error: String,
}

/// Per-chunk parse output, merged into the processor's columns afterwards.
///
/// `float64_batches` has one vector per column; text columns keep theirs
/// empty.
#[cfg(feature = "columnar-engine")]
#[derive(Debug, Default)]
pub(crate) struct BatchResult {
    pub float64_batches: Vec<Vec<f64>>,
    pub row_count: usize,
    pub line_count: usize,
    pub errors: Vec<ParseError>,
}

