#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Float64,
    /// Anything that did not parse as a number in the first data row. Its
    /// values are validated for field count only and not kept.
    Text,
}

/// A column stored as one vector per parsed chunk.
#[derive(Debug, Clone)]
pub enum Column {
    Float64(Vec<Vec<f64>>),
    Text,
}

impl Column {
    pub fn new(column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Float64 => Column::Float64(Vec::new()),
            ColumnType::Text => Column::Text,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Float64(_))
    }

    /// Values of one chunk. `None` for text columns or a chunk past the end.
    pub fn numeric_chunk(&self, chunk: usize) -> Option<&[f64]> {
        match self {
            Column::Float64(chunks) => chunks.get(chunk).map(Vec::as_slice),
            Column::Text => None,
        }
    }

    /// Numeric value at `(chunk, offset)`.
    pub fn get_f64(&self, chunk: usize, offset: usize) -> Option<f64> {
        self.numeric_chunk(chunk)?.get(offset).copied()
    }
}
