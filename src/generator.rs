//! Deterministic synthetic sensor dataset.
//!
//! Record `i` carries the timestamp `EPOCH_BASE + i` seconds, a sensor label
//! drawn uniformly from the fixed pool and a value drawn uniformly from
//! `[0, 100)` on a 4-decimal grid. Both draws come from one seeded [`StdRng`],
//! so a seed and a row count fully determine the bytes of the file.

use chrono::DateTime;
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Serialize;
use std::{
    fs::{self, File},
    io::BufWriter,
    path::Path,
    time::Instant,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{CSV_HEADER, EPOCH_BASE, SENSOR_COUNT, SENSOR_PREFIX, TIMESTAMP_FORMAT};

/// Values are drawn as integers in `0..VALUE_STEPS` and scaled down, which
/// keeps them on the 4-decimal grid and strictly below 100.
const VALUE_STEPS: u32 = 1_000_000;
const VALUE_SCALE: f64 = 10_000.0;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Timestamp {0} is outside the representable range")]
    TimestampOutOfRange(i64),
}

/// One dataset row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record<'a> {
    #[serde(rename = "Timestamp")]
    pub timestamp: String,

    #[serde(rename = "SensorID")]
    pub sensor_id: &'a str,

    #[serde(rename = "Value")]
    pub value: f64,
}

/// What the generator reports back for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationSummary {
    pub rows: u64,
    pub bytes: u64,
    pub elapsed_s: f64,
}

impl GenerationSummary {
    pub fn size_mb(&self) -> f64 {
        self.bytes as f64 / 1_048_576.0
    }
}

/// The fixed sensor pool, `SENSOR_001` through `SENSOR_050`.
pub fn sensor_labels() -> Vec<String> {
    (1..=SENSOR_COUNT)
        .map(|i| format!("{SENSOR_PREFIX}{i:03}"))
        .collect()
}

/// Formats the timestamp of record `index`.
pub fn timestamp_for(index: u64) -> Result<String, GenerateError> {
    let secs = EPOCH_BASE + index as i64;
    let ts = DateTime::from_timestamp(secs, 0).ok_or(GenerateError::TimestampOutOfRange(secs))?;
    Ok(ts.format(TIMESTAMP_FORMAT).to_string())
}

/// Lazily yields the records of a dataset.
pub struct RecordStream<'a> {
    rng: StdRng,
    sensors: &'a [String],
    next: u64,
    rows: u64,
}

impl<'a> RecordStream<'a> {
    pub fn new(sensors: &'a [String], rows: u64, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            sensors,
            next: 0,
            rows,
        }
    }
}

impl<'a> Iterator for RecordStream<'a> {
    type Item = Result<Record<'a>, GenerateError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.rows {
            return None;
        }
        let index = self.next;
        self.next += 1;

        let sensor_id = self.sensors[self.rng.random_range(0..self.sensors.len())].as_str();
        let value = f64::from(self.rng.random_range(0..VALUE_STEPS)) / VALUE_SCALE;

        Some(timestamp_for(index).map(|timestamp| Record {
            timestamp,
            sensor_id,
            value,
        }))
    }
}

/// Writes `rows` records plus the header to `path`, replacing any existing
/// file.
///
/// # Errors
/// Any IO or serialization failure is returned as is. The file may then be
/// truncated; callers must not treat it as a usable dataset.
pub fn generate(path: &Path, rows: u64, seed: u64) -> Result<GenerationSummary, GenerateError> {
    let start = Instant::now();
    let sensors = sensor_labels();

    let file = File::create(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(BufWriter::new(file));

    writer.write_record(CSV_HEADER)?;
    for record in RecordStream::new(&sensors, rows, seed) {
        writer.serialize(record?)?;
    }
    writer.flush()?;
    drop(writer);

    let bytes = fs::metadata(path)?.len();
    let elapsed = start.elapsed();
    debug!(rows, bytes, ?elapsed, path = %path.display(), "dataset written");
    info!(rows, "generated dataset");

    Ok(GenerationSummary {
        rows,
        bytes,
        elapsed_s: elapsed.as_secs_f64(),
    })
}
