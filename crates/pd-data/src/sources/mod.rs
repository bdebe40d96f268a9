pub mod csv_source;
pub mod sqlite_source;

pub use csv_source::CsvSource;
pub use sqlite_source::SqliteSource;

use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Builder, StringBuilder};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use pd_core::HostYear;

use crate::config::SourceConfig;
use crate::schema::FlatColumn;
use crate::DataError;

/// Filter applied to the `event ⋈ host_event ⋈ host` join
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinPredicate {
    /// Every edition that has a host link
    All,
    /// Exact match on host name and year
    HostYear(HostYear),
}

/// Read access to the two record sets backing the dashboard
pub trait TabularSource: Send + Sync {
    /// All rows of the flat record set, restricted to `columns`
    fn read(&self, columns: &[FlatColumn]) -> Result<RecordBatch, DataError>;

    /// Rows of the relational join matching `predicate`.
    ///
    /// Editions without a host link are excluded, never reported as errors.
    fn query(&self, predicate: &JoinPredicate) -> Result<RecordBatch, DataError>;

    /// Get the source name
    fn source_name(&self) -> &str;

    /// Cheap reachability check run when a session opens
    fn check(&self) -> Result<(), DataError> {
        Ok(())
    }
}

/// Flat CSV plus relational SQLite, the production pairing
pub struct EditionSource {
    flat: CsvSource,
    relational: SqliteSource,
    name: String,
}

impl EditionSource {
    pub fn new(flat: CsvSource, relational: SqliteSource) -> Self {
        let name = format!("{} + {}", flat.source_name(), relational.source_name());
        Self { flat, relational, name }
    }

    pub fn from_config(config: &SourceConfig) -> Self {
        Self::new(
            CsvSource::new(&config.csv_path, config.null_config.clone()),
            SqliteSource::new(&config.db_path),
        )
    }
}

impl TabularSource for EditionSource {
    fn read(&self, columns: &[FlatColumn]) -> Result<RecordBatch, DataError> {
        self.flat.read(columns)
    }

    fn query(&self, predicate: &JoinPredicate) -> Result<RecordBatch, DataError> {
        self.relational.query(predicate)
    }

    fn source_name(&self) -> &str {
        &self.name
    }

    /// Verify both record sets can be opened and carry the expected layout
    fn check(&self) -> Result<(), DataError> {
        self.flat.check_headers()?;
        self.relational.check_tables()?;
        tracing::info!("Data source '{}' is reachable", self.name);
        Ok(())
    }
}

/// Typed arrow builder for one output column
pub(crate) enum ColumnBuilder {
    Int(Int64Builder),
    Text(StringBuilder),
}

impl ColumnBuilder {
    pub(crate) fn for_type(data_type: &DataType) -> Self {
        match data_type {
            DataType::Int64 => ColumnBuilder::Int(Int64Builder::new()),
            _ => ColumnBuilder::Text(StringBuilder::new()),
        }
    }

    pub(crate) fn append_null(&mut self) {
        match self {
            ColumnBuilder::Int(builder) => builder.append_null(),
            ColumnBuilder::Text(builder) => builder.append_null(),
        }
    }

    pub(crate) fn finish(self) -> ArrayRef {
        match self {
            ColumnBuilder::Int(mut builder) => Arc::new(builder.finish()),
            ColumnBuilder::Text(mut builder) => Arc::new(builder.finish()),
        }
    }
}

/// Parse an integer cell, accepting float renderings of whole numbers
/// such as `301.0` which spreadsheet exports produce for nullable columns.
pub(crate) fn parse_int(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("301"), Some(301));
        assert_eq!(parse_int(" 301.0 "), Some(301));
        assert_eq!(parse_int("301.5"), None);
        assert_eq!(parse_int("many"), None);
        assert_eq!(parse_int("1e30"), None);
        assert_eq!(parse_int("-1e19"), None);
        assert_eq!(parse_int("4e3"), Some(4000));
    }
}
