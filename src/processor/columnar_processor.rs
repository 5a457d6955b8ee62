use memchr::memchr_iter;
use memmap2::Mmap;
use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};
use std::{fs::File, path::Path};

use crate::{
    helpers::simd_helpers::{filter_gt_f64, sum_f64},
    processor::{
        BatchResult, ParseError, ParseSummary, ProcessorError,
        column::{Column, ColumnType},
    },
};

/// Main processor for columnar CSV data
///
/// # Examples
///
/// ```no_run
/// # use sensor_bench::processor::ColumnarProcessor;
/// let mut processor = ColumnarProcessor::new();
/// processor.load_csv("data.csv".as_ref()).unwrap();
/// let rows = processor.filter_greater_than("Value", 50.0).unwrap();
/// let avg = processor.average_rows("Value", &rows).unwrap();
/// println!("{} rows, avg {avg}", rows.len());
/// ```
#[derive(Debug)]
pub struct ColumnarProcessor {
    columns: Vec<Column>,
    chunk_starts: Vec<usize>,
    row_count: usize,
    headers: Vec<String>,
}

impl ColumnarProcessor {
    /// Create an empty processor
    pub fn new() -> Self {
        ColumnarProcessor {
            columns: Vec::new(),
            chunk_starts: Vec::new(),
            row_count: 0,
            headers: Vec::new(),
        }
    }

    /// Loads a CSV file through a memory map
    ///
    /// A column is numeric when its field in the first data row parses as a
    /// number, integer or decimal, and is then stored as `f64`. Otherwise it
    /// is text. A file with a header and no data rows loads as zero rows with
    /// every column numeric, so filters over it select nothing.
    ///
    /// Lines that do not fit the schema are skipped and reported in the
    /// returned [`ParseSummary`].
    ///
    /// # Errors
    /// Returns a [`ProcessorError`] if the file cannot be opened or mapped,
    /// or has no header line.
    pub fn load_csv(&mut self, path: &Path) -> Result<ParseSummary, ProcessorError> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        let buf: &[u8] = &mmap[..];

        // Parse header
        let header_end = buf
            .iter()
            .position(|&b| b == b'\n')
            .unwrap_or(buf.len());
        let header_line = trim_cr(&buf[..header_end]);
        if header_line.is_empty() {
            return Err(ProcessorError::Parse("Missing header line".into()));
        }
        let headers: Vec<String> = header_line
            .split(|&b| b == b',')
            .map(|s| String::from_utf8_lossy(s).trim().to_string())
            .collect();

        let data_start = (header_end + 1).min(buf.len());
        let data = &buf[data_start..];

        let schema = match first_line(data) {
            Some(line) => Self::infer_schema(line, &headers)?,
            None => vec![ColumnType::Float64; headers.len()],
        };

        // Find chunk boundaries (split by newlines)
        let num_threads = rayon::current_num_threads().max(1);
        let chunks = Self::find_chunk_boundaries(data, num_threads);

        let estimated_rows_per_chunk = first_line(data)
            .map(|line| data.len() / num_threads / (line.len() + 1) + 1000)
            .unwrap_or(0);

        let batch_results: Vec<BatchResult> = chunks
            .par_iter()
            .map(|(start, end)| {
                Self::parse_chunk(&data[*start..*end], &schema, &headers, estimated_rows_per_chunk)
            })
            .collect();

        let mut columns: Vec<Column> = schema.iter().map(|&t| Column::new(t)).collect();
        let mut chunk_starts = Vec::with_capacity(batch_results.len());
        let mut total_rows = 0;
        let mut lines_before = 1; // the header
        let mut all_errors = Vec::new();

        for mut batch in batch_results {
            all_errors.extend(batch.errors.drain(..).map(|mut e| {
                e.line += lines_before;
                e
            }));
            lines_before += batch.line_count;

            // Chunk starts must stay strictly increasing for `locate`.
            if batch.row_count == 0 {
                continue;
            }
            chunk_starts.push(total_rows);
            total_rows += batch.row_count;

            for (col_idx, column) in columns.iter_mut().enumerate() {
                if let Column::Float64(chunks) = column {
                    chunks.push(std::mem::take(&mut batch.float64_batches[col_idx]));
                }
            }
        }

        tracing::debug!(
            rows = total_rows,
            chunks = chunk_starts.len(),
            errors = all_errors.len(),
            "csv loaded"
        );

        self.columns = columns;
        self.chunk_starts = chunk_starts;
        self.headers = headers;
        self.row_count = total_rows;

        Ok(ParseSummary {
            rows_processed: total_rows,
            errors: all_errors,
        })
    }

    fn infer_schema(first_line: &[u8], headers: &[String]) -> Result<Vec<ColumnType>, ProcessorError> {
        let fields: Vec<&[u8]> = first_line.split(|&b| b == b',').collect();

        if fields.len() != headers.len() {
            return Err(ProcessorError::Parse(format!(
                "Header/data mismatch: {} vs {}",
                headers.len(),
                fields.len()
            )));
        }

        let schema = fields
            .iter()
            .map(|field| {
                if fast_float::parse::<f64, _>(field).is_ok() {
                    ColumnType::Float64
                } else {
                    ColumnType::Text
                }
            })
            .collect();

        Ok(schema)
    }

    fn find_chunk_boundaries(data: &[u8], num_chunks: usize) -> Vec<(usize, usize)> {
        if data.is_empty() {
            return vec![];
        }

        let chunk_size = data.len() / num_chunks;
        let mut boundaries = Vec::with_capacity(num_chunks);
        let mut start = 0;

        for i in 0..num_chunks - 1 {
            let mut end = ((i + 1) * chunk_size).max(start);

            // Find next newline
            while end < data.len() && data[end] != b'\n' {
                end += 1;
            }

            if end < data.len() {
                end += 1; // Include the newline
            }

            if start < end {
                boundaries.push((start, end));
            }
            start = end;
        }

        // Last chunk gets everything remaining
        if start < data.len() {
            boundaries.push((start, data.len()));
        }

        boundaries
    }

    fn parse_chunk(
        chunk: &[u8],
        schema: &[ColumnType],
        headers: &[String],
        estimated_rows: usize,
    ) -> BatchResult {
        let num_cols = schema.len();

        let mut batch = BatchResult {
            float64_batches: schema
                .iter()
                .map(|&t| match t {
                    ColumnType::Float64 => Vec::with_capacity(estimated_rows),
                    ColumnType::Text => Vec::new(),
                })
                .collect(),
            ..BatchResult::default()
        };

        let mut fields = Vec::with_capacity(num_cols);
        let mut cells: Vec<(usize, f64)> = Vec::with_capacity(num_cols);

        let mut start = 0;
        let mut line_ends: Vec<usize> = memchr_iter(b'\n', chunk).collect();
        if chunk.last().is_some_and(|&b| b != b'\n') {
            line_ends.push(chunk.len()); // final line without a newline
        }

        'lines: for line_end in line_ends {
            let line = trim_cr(&chunk[start..line_end]);
            start = line_end + 1;
            batch.line_count += 1;

            if line.is_empty() {
                continue;
            }

            fields.clear();
            let mut field_start = 0;
            for comma_pos in memchr_iter(b',', line) {
                fields.push((field_start, comma_pos));
                field_start = comma_pos + 1;
            }
            fields.push((field_start, line.len()));

            if fields.len() != num_cols {
                batch.errors.push(ParseError {
                    line: batch.line_count,
                    column: String::new(),
                    value: String::from_utf8_lossy(line).into_owned(),
                    error: format!("expected {} fields, got {}", num_cols, fields.len()),
                });
                continue;
            }

            // A line is committed only once every numeric field parsed, so
            // the columns stay aligned.
            cells.clear();
            for (col_idx, &(s, e)) in fields.iter().enumerate() {
                if schema[col_idx] == ColumnType::Text {
                    continue;
                }
                let raw = &line[s..e];
                match fast_float::parse::<f64, _>(raw) {
                    Ok(v) => cells.push((col_idx, v)),
                    Err(err) => {
                        batch.errors.push(ParseError {
                            line: batch.line_count,
                            column: headers[col_idx].clone(),
                            value: String::from_utf8_lossy(raw).into_owned(),
                            error: err.to_string(),
                        });
                        continue 'lines;
                    }
                }
            }

            for &(col_idx, v) in &cells {
                batch.float64_batches[col_idx].push(v);
            }
            batch.row_count += 1;
        }

        batch
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Rows whose value in `column` is strictly above `threshold`, in
    /// ascending order.
    ///
    /// Chunks are filtered in parallel, each with the SIMD kernel.
    pub fn filter_greater_than(
        &self,
        column: &str,
        threshold: f64,
    ) -> Result<Vec<usize>, ProcessorError> {
        let col = self.numeric_col(column)?;

        let per_chunk: Vec<Vec<usize>> = self
            .chunk_starts
            .par_iter()
            .enumerate()
            .map(|(chunk, &base)| match col.numeric_chunk(chunk) {
                Some(values) => filter_gt_f64(values, threshold, base),
                None => Vec::new(),
            })
            .collect();

        Ok(per_chunk.concat())
    }

    /// Mean of `column` over the given rows, typically the output of
    /// [`ColumnarProcessor::filter_greater_than`].
    ///
    /// # Errors
    /// [`ProcessorError::EmptySelection`] when `rows` is empty.
    pub fn average_rows(&self, column: &str, rows: &[usize]) -> Result<f64, ProcessorError> {
        let col = self.numeric_col(column)?;
        if rows.is_empty() {
            return Err(ProcessorError::EmptySelection);
        }
        let values = rows
            .iter()
            .map(|&row| {
                let (chunk, offset) = self.locate(row)?;
                col.get_f64(chunk, offset)
                    .ok_or(ProcessorError::RowOutOfRange { row, rows: self.row_count })
            })
            .collect::<Result<Vec<f64>, _>>()?;
        Ok(sum_f64(&values) / values.len() as f64)
    }

    /// Maps a global row index to `(chunk, offset)`.
    fn locate(&self, row: usize) -> Result<(usize, usize), ProcessorError> {
        if row >= self.row_count {
            return Err(ProcessorError::RowOutOfRange { row, rows: self.row_count });
        }
        let chunk = self.chunk_starts.partition_point(|&start| start <= row) - 1;
        Ok((chunk, row - self.chunk_starts[chunk]))
    }

    fn numeric_col(&self, column: &str) -> Result<&Column, ProcessorError> {
        let col = self.get_col(column)?;
        if !col.is_numeric() {
            return Err(ProcessorError::NotNumeric { column: column.to_string() });
        }
        Ok(col)
    }

    fn get_col(&self, col_name: &str) -> Result<&Column, ProcessorError> {
        let col_pos = self
            .headers
            .iter()
            .position(|cn| cn == col_name)
            .ok_or_else(|| ProcessorError::MissingColumn(col_name.to_string()))?;

        self.columns
            .get(col_pos)
            .ok_or_else(|| ProcessorError::MissingColumn(col_name.to_string()))
    }
}

impl Default for ColumnarProcessor {
    fn default() -> Self {
        Self::new()
    }
}

fn trim_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn first_line(data: &[u8]) -> Option<&[u8]> {
    data.split(|&b| b == b'\n')
        .map(trim_cr)
        .find(|line| !line.is_empty())
}
