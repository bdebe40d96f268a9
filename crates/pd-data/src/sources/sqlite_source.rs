//! Relational SQLite record set (`event`, `host`, `host_event`)

use std::path::{Path, PathBuf};

use arrow::record_batch::RecordBatch;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags};

use super::{ColumnBuilder, JoinPredicate};
use crate::schema::{joined_schema, JOINED_COLUMNS};
use crate::DataError;

const REQUIRED_TABLES: [&str; 3] = ["event", "host", "host_event"];

/// SQLite data source implementation
///
/// No connection is kept between calls. Every query opens a read-only
/// connection, runs, and closes it before returning, on success and on error.
pub struct SqliteSource {
    path: PathBuf,
}

impl SqliteSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` against a freshly opened connection and close it afterwards
    pub fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, DataError>,
    ) -> Result<T, DataError> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| DataError::unavailable(self.source_name(), e))?;

        let result = conn
            .execute_batch("PRAGMA foreign_keys = ON")
            .map_err(DataError::from)
            .and_then(|_| f(&conn));

        if let Err((_, e)) = conn.close() {
            tracing::warn!("Failed to close connection to {}: {}", self.source_name(), e);
        }
        result
    }

    /// Verify the three relational tables exist
    pub fn check_tables(&self) -> Result<(), DataError> {
        self.with_connection(|conn| {
            for table in REQUIRED_TABLES {
                let found: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    params![table],
                    |row| row.get(0),
                )?;
                if found == 0 {
                    return Err(DataError::Schema(format!("database has no '{}' table", table)));
                }
            }
            Ok(())
        })
    }

    fn join_sql(predicate: &JoinPredicate) -> String {
        let select_list = JOINED_COLUMNS
            .iter()
            .map(|(_, expr, _)| *expr)
            .collect::<Vec<_>>()
            .join(", ");
        let filter = match predicate {
            JoinPredicate::All => "",
            JoinPredicate::HostYear(_) => "WHERE event.year = ?1 AND host.host = ?2",
        };
        format!(
            "SELECT {select_list} FROM event \
             JOIN host_event ON event.event_id = host_event.event_id \
             JOIN host ON host_event.host_id = host.host_id \
             {filter} ORDER BY event.year, host.host"
        )
    }

    /// Query the joined record set
    pub fn query(&self, predicate: &JoinPredicate) -> Result<RecordBatch, DataError> {
        self.with_connection(|conn| {
            let sql = Self::join_sql(predicate);
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = match predicate {
                JoinPredicate::All => stmt.query([])?,
                JoinPredicate::HostYear(key) => stmt.query(params![key.year, key.host])?,
            };

            let mut builders: Vec<ColumnBuilder> = JOINED_COLUMNS
                .iter()
                .map(|(_, _, ty)| ColumnBuilder::for_type(&ty.data_type()))
                .collect();

            let mut row_count = 0usize;
            while let Some(row) = rows.next()? {
                row_count += 1;
                for (col_idx, builder) in builders.iter_mut().enumerate() {
                    let value = row.get_ref(col_idx)?;
                    append_value(builder, value);
                }
            }
            drop(rows);

            if matches!(predicate, JoinPredicate::All) {
                let unlinked = Self::count_unlinked(conn)?;
                if unlinked > 0 {
                    tracing::debug!("{} editions have no host link and were excluded", unlinked);
                }
            }
            tracing::debug!("Join query {:?} returned {} rows", predicate, row_count);

            let arrays = builders.into_iter().map(ColumnBuilder::finish).collect();
            RecordBatch::try_new(joined_schema(), arrays).map_err(DataError::from)
        })
    }

    /// Editions the inner join silently drops
    fn count_unlinked(conn: &Connection) -> Result<i64, DataError> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM event WHERE event_id NOT IN (
                SELECT host_event.event_id FROM host_event
                JOIN host ON host_event.host_id = host.host_id
            )",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn source_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown.db")
    }
}

fn append_value(builder: &mut ColumnBuilder, value: ValueRef<'_>) {
    match builder {
        ColumnBuilder::Int(builder) => match value {
            ValueRef::Integer(i) => builder.append_value(i),
            ValueRef::Real(f) if f.is_finite() && f.fract() == 0.0 => builder.append_value(f as i64),
            ValueRef::Text(s) => match std::str::from_utf8(s).ok().and_then(super::parse_int) {
                Some(i) => builder.append_value(i),
                None => builder.append_null(),
            },
            _ => builder.append_null(),
        },
        ColumnBuilder::Text(builder) => match value {
            ValueRef::Text(s) => match std::str::from_utf8(s) {
                Ok(text) => builder.append_value(text),
                Err(_) => builder.append_null(),
            },
            ValueRef::Integer(i) => builder.append_value(i.to_string()),
            ValueRef::Real(f) => builder.append_value(f.to_string()),
            _ => builder.append_null(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample;
    use arrow::array::{Array, Int64Array, StringArray};
    use pd_core::HostYear;

    #[test]
    fn test_query_all_joins_every_linked_edition() {
        let dir = tempfile::tempdir().unwrap();
        let config = sample::write_sample(dir.path()).unwrap();
        let source = SqliteSource::new(&config.db_path);

        let batch = source.query(&JoinPredicate::All).unwrap();
        assert_eq!(batch.num_rows(), sample::EDITIONS.len());

        let years = batch.column_by_name("year").unwrap().as_any().downcast_ref::<Int64Array>().unwrap();
        let ordered: Vec<i64> = (0..years.len()).map(|i| years.value(i)).collect();
        let mut sorted = ordered.clone();
        sorted.sort();
        assert_eq!(ordered, sorted);
    }

    #[test]
    fn test_query_host_year_binds_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let config = sample::write_sample(dir.path()).unwrap();
        let source = SqliteSource::new(&config.db_path);

        let batch = source
            .query(&JoinPredicate::HostYear(HostYear::new("Salt Lake City", 2002)))
            .unwrap();
        assert_eq!(batch.num_rows(), 1);
        let hosts = batch.column_by_name("host").unwrap().as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(hosts.value(0), "Salt Lake City");

        let none = source
            .query(&JoinPredicate::HostYear(HostYear::new("Sydney'; DROP TABLE event; --", 2000)))
            .unwrap();
        assert_eq!(none.num_rows(), 0);
        assert!(source.check_tables().is_ok());
    }

    #[test]
    fn test_unlinked_editions_are_excluded() {
        let dir = tempfile::tempdir().unwrap();
        let config = sample::write_sample(dir.path()).unwrap();
        {
            let conn = Connection::open(&config.db_path).unwrap();
            conn.execute(
                "INSERT INTO event (event_id, type, year, participants, events, sports, countries)
                 VALUES (999, 'summer', 1984, 2102, 975, 18, 54)",
                [],
            )
            .unwrap();
        }
        let source = SqliteSource::new(&config.db_path);

        let batch = source.query(&JoinPredicate::All).unwrap();
        assert_eq!(batch.num_rows(), sample::EDITIONS.len());
    }

    #[test]
    fn test_missing_database_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = SqliteSource::new(dir.path().join("absent.db"));

        let err = source.query(&JoinPredicate::All).unwrap_err();
        assert!(matches!(err, DataError::SourceUnavailable { .. }));
        assert!(!dir.path().join("absent.db").exists());
    }

    #[test]
    fn test_missing_table_fails_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.db");
        Connection::open(&path).unwrap().execute_batch("CREATE TABLE event (event_id INTEGER)").unwrap();

        let source = SqliteSource::new(&path);
        assert!(matches!(source.check_tables(), Err(DataError::Schema(_))));
    }

    #[test]
    fn test_connection_released_on_error_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = sample::write_sample(dir.path()).unwrap();
        let source = SqliteSource::new(&config.db_path);

        let failed: Result<(), DataError> =
            source.with_connection(|_| Err(DataError::DataIntegrity("boom".to_string())));
        assert!(failed.is_err());

        assert!(source.query(&JoinPredicate::All).is_ok());
        let writer = Connection::open(&config.db_path).unwrap();
        writer.execute_batch("BEGIN EXCLUSIVE; COMMIT;").unwrap();
    }
}
