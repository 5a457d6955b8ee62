//! Label-based extraction of metrics from the external process's stdout.
//!
//! The external process prints human-readable lines. A line is recognised by
//! containing one of the four labels below; its value is whatever follows the
//! last `:` on the line, trimmed. Lines may come in any order and unrelated
//! lines are ignored:
//!
//! ```text
//! Total rows read   : 1,000,000
//! Rows after filter : 400,000
//! Average value     : 75.123456        (or "N/A ...")
//! Wall-clock time   : 0.42s
//! ```

use std::num::{ParseFloatError, ParseIntError};
use thiserror::Error;

use crate::runner::Average;

pub const TOTAL_ROWS_LABEL: &str = "Total rows read";
pub const FILTERED_ROWS_LABEL: &str = "Rows after filter";
pub const AVERAGE_LABEL: &str = "Average value";
pub const WALL_CLOCK_LABEL: &str = "Wall-clock time";

/// Token that marks an undefined average.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Error, PartialEq)]
pub enum ExtractError {
    #[error("'{label}' has a malformed row count '{text}': {source}")]
    InvalidCount {
        label: &'static str,
        text: String,
        source: ParseIntError,
    },

    #[error("'{label}' has a malformed value '{text}': {source}")]
    InvalidAverage {
        label: &'static str,
        text: String,
        source: ParseFloatError,
    },
}

/// Fields recovered from stdout. Each is `None` when its label never
/// appeared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedMetrics {
    pub total_rows: Option<u64>,
    pub filtered_rows: Option<u64>,
    pub average: Option<Average>,
    /// The process's own timing, kept verbatim for display.
    pub wall_clock: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum Label {
    TotalRows,
    FilteredRows,
    Average,
    WallClock,
}

impl Label {
    const ALL: [Label; 4] = [
        Label::TotalRows,
        Label::FilteredRows,
        Label::Average,
        Label::WallClock,
    ];

    fn text(self) -> &'static str {
        match self {
            Label::TotalRows => TOTAL_ROWS_LABEL,
            Label::FilteredRows => FILTERED_ROWS_LABEL,
            Label::Average => AVERAGE_LABEL,
            Label::WallClock => WALL_CLOCK_LABEL,
        }
    }

    fn find(line: &str) -> Option<Label> {
        Self::ALL.into_iter().find(|l| line.contains(l.text()))
    }
}

/// Text after the last colon, trimmed. A line without a colon yields itself.
fn value_of(line: &str) -> &str {
    line.rsplit(':').next().unwrap_or(line).trim()
}

fn parse_count(label: Label, text: &str) -> Result<u64, ExtractError> {
    text.replace(',', "")
        .parse()
        .map_err(|source| ExtractError::InvalidCount {
            label: label.text(),
            text: text.to_string(),
            source,
        })
}

fn parse_average(text: &str) -> Result<Average, ExtractError> {
    if text.split_whitespace().next() == Some(NOT_AVAILABLE) {
        return Ok(Average::Undefined);
    }
    let value: f64 = text.parse().map_err(|source| ExtractError::InvalidAverage {
        label: AVERAGE_LABEL,
        text: text.to_string(),
        source,
    })?;
    Ok(if value.is_nan() {
        Average::Undefined
    } else {
        Average::Mean(value)
    })
}

/// Recovers the labelled metrics from `stdout`.
///
/// # Errors
/// A recognised label followed by text that is not a number. The whole
/// extraction fails, so no field is silently defaulted.
pub fn extract_metrics(stdout: &str) -> Result<ExtractedMetrics, ExtractError> {
    let mut metrics = ExtractedMetrics::default();

    for line in stdout.lines().map(str::trim) {
        let Some(label) = Label::find(line) else {
            continue;
        };
        let value = value_of(line);

        match label {
            Label::TotalRows => metrics.total_rows = Some(parse_count(label, value)?),
            Label::FilteredRows => metrics.filtered_rows = Some(parse_count(label, value)?),
            Label::Average => metrics.average = Some(parse_average(value)?),
            Label::WallClock => metrics.wall_clock = Some(value.to_string()),
        }
    }

    Ok(metrics)
}
