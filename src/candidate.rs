//! Workload of the `rust-cli` executable.
//!
//! Reads the whole dataset through `csv` + `serde`, then filters and averages
//! it with rayon. This is the external side of the comparison; it shares no
//! code with the columnar engine.

use csv::{ReaderBuilder, Trim};
use rayon::prelude::*;
use serde::Deserialize;
use std::{collections::HashMap, path::Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CandidateError {
    #[error("cannot open CSV file '{path}': {source}")]
    Open { path: String, source: csv::Error },

    #[error("failed to deserialize a row of '{path}': {source}")]
    Row { path: String, source: csv::Error },
}

#[derive(Debug, Clone, Deserialize)]
pub struct SensorRecord {
    #[serde(rename = "SensorID")]
    pub sensor_id: String,

    #[serde(rename = "Value")]
    pub value: f64,
}

/// Running count and sum; mergeable across rayon splits.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Tally {
    count: u64,
    sum: f64,
}

impl Tally {
    fn add(mut self, value: f64) -> Self {
        self.count += 1;
        self.sum += value;
        self
    }

    fn merge(self, other: Self) -> Self {
        Self {
            count: self.count + other.count,
            sum: self.sum + other.sum,
        }
    }

    fn mean(self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensorStats {
    pub sensor_id: String,
    pub count: u64,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadStats {
    pub total_rows: u64,
    pub filtered_rows: u64,
    /// `None` when no row passed the filter.
    pub average: Option<f64>,
    /// Filled only when requested; sorted by sensor id.
    pub per_sensor: Vec<SensorStats>,
}

impl WorkloadStats {
    pub fn removed_rows(&self) -> u64 {
        self.total_rows - self.filtered_rows
    }

    pub fn removed_percent(&self) -> f64 {
        if self.total_rows == 0 {
            0.0
        } else {
            self.removed_rows() as f64 / self.total_rows as f64 * 100.0
        }
    }
}

/// Reads every record of `path`. Columns other than `SensorID` and `Value`
/// are ignored.
pub fn read_records(path: &Path) -> Result<Vec<SensorRecord>, CandidateError> {
    let display = || path.display().to_string();

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(|source| CandidateError::Open {
            path: display(),
            source,
        })?;

    reader
        .deserialize()
        .collect::<Result<Vec<SensorRecord>, _>>()
        .map_err(|source| CandidateError::Row {
            path: display(),
            source,
        })
}

/// Keeps records with a value strictly above `threshold` and averages them.
pub fn process(
    records: &[SensorRecord],
    threshold: f64,
    per_sensor: bool,
) -> WorkloadStats {
    let tally = records
        .par_iter()
        .filter(|r| r.value > threshold)
        .fold(Tally::default, |acc, r| acc.add(r.value))
        .reduce(Tally::default, Tally::merge);

    WorkloadStats {
        total_rows: records.len() as u64,
        filtered_rows: tally.count,
        average: tally.mean(),
        per_sensor: if per_sensor {
            sensor_breakdown(records, threshold)
        } else {
            Vec::new()
        },
    }
}

fn sensor_breakdown(records: &[SensorRecord], threshold: f64) -> Vec<SensorStats> {
    let tallies = records
        .par_iter()
        .filter(|r| r.value > threshold)
        .fold(HashMap::<&str, Tally>::new, |mut map, r| {
            let entry = map.entry(r.sensor_id.as_str()).or_default();
            *entry = entry.add(r.value);
            map
        })
        .reduce(HashMap::new, |mut left, right| {
            for (id, tally) in right {
                let entry = left.entry(id).or_default();
                *entry = entry.merge(tally);
            }
            left
        });

    let mut stats: Vec<SensorStats> = tallies
        .into_iter()
        .filter_map(|(id, tally)| {
            tally.mean().map(|average| SensorStats {
                sensor_id: id.to_string(),
                count: tally.count,
                average,
            })
        })
        .collect();
    stats.sort_unstable_by(|a, b| a.sensor_id.cmp(&b.sensor_id));
    stats
}
