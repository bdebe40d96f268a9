//! Flat per-edition CSV record set

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use arrow::record_batch::RecordBatch;
use csv::{ReaderBuilder, StringRecord};

use super::{parse_int, ColumnBuilder};
use crate::config::NullConfig;
use crate::schema::{flat_schema, FlatColumn};
use crate::DataError;

/// CSV data source for the flat record set
///
/// The file is opened on every [`CsvSource::read`] and closed before the call
/// returns, so edits to the file are picked up on the next dispatch.
pub struct CsvSource {
    /// Path to the CSV file
    path: PathBuf,
    /// Cells treated as absent
    null_config: NullConfig,
}

impl CsvSource {
    pub fn new(path: impl AsRef<Path>, null_config: NullConfig) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            null_config,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_reader(&self) -> Result<csv::Reader<BufReader<File>>, DataError> {
        let file = File::open(&self.path).map_err(|e| DataError::unavailable(self.source_name(), e))?;
        Ok(ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(BufReader::new(file)))
    }

    /// Position of each requested column in the file's header row
    fn locate(headers: &StringRecord, columns: &[FlatColumn]) -> Result<Vec<usize>, DataError> {
        columns
            .iter()
            .map(|column| {
                headers
                    .iter()
                    .position(|header| header == column.name())
                    .ok_or_else(|| DataError::Schema(format!("CSV file has no '{}' column", column)))
            })
            .collect()
    }

    /// Verify every column of the fixed schema is present
    pub fn check_headers(&self) -> Result<(), DataError> {
        let mut reader = self.open_reader()?;
        let headers = reader.headers()?.clone();
        Self::locate(&headers, &FlatColumn::ALL).map(|_| ())
    }

    /// Read every row, keeping only `columns` in the order given
    pub fn read(&self, columns: &[FlatColumn]) -> Result<RecordBatch, DataError> {
        if columns.is_empty() {
            return Err(DataError::InvalidParameter("at least one column must be requested".to_string()));
        }

        let mut reader = self.open_reader()?;
        let headers = reader.headers()?.clone();
        let indices = Self::locate(&headers, columns)?;

        let mut builders: Vec<ColumnBuilder> = columns
            .iter()
            .map(|column| ColumnBuilder::for_type(&column.data_type()))
            .collect();

        let mut row_count = 0usize;
        for result in reader.records() {
            let record = result?;
            row_count += 1;

            for ((column, &idx), builder) in columns.iter().zip(&indices).zip(builders.iter_mut()) {
                let raw = record.get(idx).unwrap_or("");
                if self.null_config.is_null(raw) {
                    builder.append_null();
                    continue;
                }
                match builder {
                    ColumnBuilder::Int(builder) => match parse_int(raw) {
                        Some(value) => builder.append_value(value),
                        None => {
                            tracing::warn!(
                                "Row {}: '{}' value '{}' is not an integer, treating as absent",
                                row_count,
                                column,
                                raw
                            );
                            builder.append_null();
                        }
                    },
                    ColumnBuilder::Text(builder) => builder.append_value(raw.trim()),
                }
            }
        }

        tracing::debug!("Read {} rows x {} columns from {}", row_count, columns.len(), self.source_name());

        let arrays = builders.into_iter().map(ColumnBuilder::finish).collect();
        RecordBatch::try_new(flat_schema(columns), arrays).map_err(DataError::from)
    }

    pub fn source_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown.csv")
    }
}
