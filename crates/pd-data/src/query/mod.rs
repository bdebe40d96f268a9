//! Query layer: typed, validated reads over a [`TabularSource`]
//!
//! Row-level integrity problems (unknown games type, coordinates that are
//! not numbers, counts that contradict each other) are absorbed here: the
//! row is dropped with a warning and the rest of the result is returned.

mod rows;

pub use rows::{EditionRecord, GenderRow, LocationRow, TimeseriesRow};

use std::sync::Arc;

use arrow::array::{Array, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use pd_core::{Feature, GamesType, HostYear};

use crate::config::SourceConfig;
use crate::schema::FlatColumn;
use crate::sources::{EditionSource, JoinPredicate, TabularSource};
use crate::DataError;

/// Exact-match edition lookup, the seam the detail card reads through
pub trait EditionLookup {
    fn edition_by_host_year(&self, key: &HostYear) -> Result<Option<EditionRecord>, DataError>;
}

/// Builds and runs the dashboard's read queries
#[derive(Clone)]
pub struct QueryLayer {
    source: Arc<dyn TabularSource>,
}

impl QueryLayer {
    pub fn new(source: Arc<dyn TabularSource>) -> Self {
        Self { source }
    }

    pub fn from_config(config: &SourceConfig) -> Self {
        Self::new(Arc::new(EditionSource::from_config(config)))
    }

    pub fn source_name(&self) -> &str {
        self.source.source_name()
    }

    pub fn check_source(&self) -> Result<(), DataError> {
        self.source.check()
    }

    /// (type, year, host, value) for every edition, both games types
    pub fn fetch_timeseries(&self, feature: Feature) -> Result<Vec<TimeseriesRow>, DataError> {
        let value_column = FlatColumn::for_feature(feature);
        let batch = self
            .source
            .read(&[FlatColumn::Type, FlatColumn::Year, FlatColumn::Host, value_column])?;

        let identity = IdentityColumns::flat(&batch)?;
        let values = int_column(&batch, value_column.name())?;

        let rows: Vec<TimeseriesRow> = (0..batch.num_rows())
            .filter_map(|i| match identity.get(i) {
                Ok((games_type, year, host)) => Some(TimeseriesRow {
                    games_type,
                    year,
                    host,
                    value: opt_int(values, i),
                }),
                Err(e) => {
                    tracing::warn!("Dropping flat row {}: {}", i + 1, e);
                    None
                }
            })
            .collect();

        tracing::debug!("fetch_timeseries({}) -> {} rows", feature, rows.len());
        Ok(rows)
    }

    /// Parse `feature` before fetching; out-of-domain names are rejected
    pub fn fetch_timeseries_named(&self, feature: &str) -> Result<Vec<TimeseriesRow>, DataError> {
        self.fetch_timeseries(feature.parse()?)
    }

    /// Male/female counts of one games type, sorted by (type, year)
    ///
    /// Editions without a gender breakdown are left out.
    pub fn fetch_gender_ratio(&self, games_type: GamesType) -> Result<Vec<GenderRow>, DataError> {
        let batch = self.source.read(&[
            FlatColumn::Type,
            FlatColumn::Year,
            FlatColumn::Host,
            FlatColumn::Participants,
            FlatColumn::ParticipantsM,
            FlatColumn::ParticipantsF,
        ])?;

        let identity = IdentityColumns::flat(&batch)?;
        let participants = int_column(&batch, FlatColumn::Participants.name())?;
        let male = int_column(&batch, FlatColumn::ParticipantsM.name())?;
        let female = int_column(&batch, FlatColumn::ParticipantsF.name())?;

        let mut rows = Vec::new();
        let mut without_breakdown = 0usize;
        for i in 0..batch.num_rows() {
            let (row_type, year, host) = match identity.get(i) {
                Ok(identity) => identity,
                Err(e) => {
                    tracing::warn!("Dropping flat row {}: {}", i + 1, e);
                    continue;
                }
            };
            if row_type != games_type {
                continue;
            }
            let (Some(m), Some(f)) = (opt_int(male, i), opt_int(female, i)) else {
                without_breakdown += 1;
                continue;
            };
            let row = GenderRow {
                games_type: row_type,
                year,
                host,
                participants: opt_int(participants, i),
                male: m,
                female: f,
            };
            match check_gender_row(&row) {
                Ok(()) => rows.push(row),
                Err(e) => tracing::warn!("Dropping {}: {}", row.label(), e),
            }
        }

        rows.sort_by_key(|row| (row.games_type, row.year));
        tracing::debug!(
            "fetch_gender_ratio({}) -> {} rows, {} without gender breakdown",
            games_type,
            rows.len(),
            without_breakdown
        );
        Ok(rows)
    }

    pub fn fetch_gender_ratio_named(&self, games_type: &str) -> Result<Vec<GenderRow>, DataError> {
        self.fetch_gender_ratio(games_type.parse()?)
    }

    /// Host, year and coordinates of every linked edition
    pub fn fetch_locations(&self) -> Result<Vec<LocationRow>, DataError> {
        let batch = self.source.query(&JoinPredicate::All)?;
        let hosts = str_column(&batch, "host")?;
        let years = int_column(&batch, "year")?;
        let latitudes = str_column(&batch, "latitude")?;
        let longitudes = str_column(&batch, "longitude")?;

        let rows: Vec<LocationRow> = (0..batch.num_rows())
            .filter_map(|i| {
                let located = (|| {
                    let host = opt_str(hosts, i)
                        .ok_or_else(|| DataError::DataIntegrity("missing host name".to_string()))?;
                    let year = to_year(opt_int(years, i))?;
                    let latitude = parse_coordinate(opt_str(latitudes, i), "latitude", 90.0)?;
                    let longitude = parse_coordinate(opt_str(longitudes, i), "longitude", 180.0)?;
                    Ok::<_, DataError>(LocationRow {
                        host: host.to_string(),
                        year,
                        latitude,
                        longitude,
                    })
                })();
                located
                    .map_err(|e| tracing::warn!("Dropping location row {}: {}", i + 1, e))
                    .ok()
            })
            .collect();

        tracing::debug!("fetch_locations() -> {} rows", rows.len());
        Ok(rows)
    }

    /// Exact-match lookup; `Ok(None)` when no edition matches
    pub fn fetch_edition_by_host_year(&self, key: &HostYear) -> Result<Option<EditionRecord>, DataError> {
        let batch = self.source.query(&JoinPredicate::HostYear(key.clone()))?;
        let mut records = records_from_batch(&batch)?;

        if records.len() > 1 {
            tracing::warn!(
                "{} editions match '{}', expected at most one; using the first",
                records.len(),
                key
            );
        }
        Ok(if records.is_empty() { None } else { Some(records.swap_remove(0)) })
    }

    /// Parse a `"{host} {year}"` label before the lookup.
    ///
    /// A label that cannot be parsed is `InvalidParameter`, unlike a
    /// well-formed key with no match, which is `Ok(None)`.
    pub fn fetch_edition_by_label(&self, label: &str) -> Result<Option<EditionRecord>, DataError> {
        self.fetch_edition_by_host_year(&HostYear::parse_label(label)?)
    }

    /// Every linked edition, ordered by year then host
    pub fn fetch_editions(&self) -> Result<Vec<EditionRecord>, DataError> {
        let batch = self.source.query(&JoinPredicate::All)?;
        records_from_batch(&batch)
    }
}

impl EditionLookup for QueryLayer {
    fn edition_by_host_year(&self, key: &HostYear) -> Result<Option<EditionRecord>, DataError> {
        self.fetch_edition_by_host_year(key)
    }
}

/// The type/year/host triple shared by every row shape
struct IdentityColumns<'a> {
    types: &'a StringArray,
    years: &'a Int64Array,
    hosts: &'a StringArray,
}

impl<'a> IdentityColumns<'a> {
    fn flat(batch: &'a RecordBatch) -> Result<Self, DataError> {
        Ok(Self {
            types: str_column(batch, FlatColumn::Type.name())?,
            years: int_column(batch, FlatColumn::Year.name())?,
            hosts: str_column(batch, FlatColumn::Host.name())?,
        })
    }

    fn get(&self, i: usize) -> Result<(GamesType, i32, String), DataError> {
        let raw_type = opt_str(self.types, i)
            .ok_or_else(|| DataError::DataIntegrity("missing games type".to_string()))?;
        let games_type = raw_type
            .parse::<GamesType>()
            .map_err(|_| DataError::DataIntegrity(format!("unknown games type '{}'", raw_type)))?;
        let year = to_year(opt_int(self.years, i))?;
        let host = opt_str(self.hosts, i)
            .ok_or_else(|| DataError::DataIntegrity("missing host name".to_string()))?;
        Ok((games_type, year, host.to_string()))
    }
}

fn records_from_batch(batch: &RecordBatch) -> Result<Vec<EditionRecord>, DataError> {
    let identity = IdentityColumns {
        types: str_column(batch, "type")?,
        years: int_column(batch, "year")?,
        hosts: str_column(batch, "host")?,
    };
    let event_ids = int_column(batch, "event_id")?;
    let participants = int_column(batch, "participants")?;
    let male = int_column(batch, "participants_m")?;
    let female = int_column(batch, "participants_f")?;
    let events = int_column(batch, "events")?;
    let sports = int_column(batch, "sports")?;
    let countries = int_column(batch, "countries")?;

    let mut records = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let (games_type, year, host) = match identity.get(i) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!("Dropping joined row {}: {}", i + 1, e);
                continue;
            }
        };
        let Some(event_id) = opt_int(event_ids, i) else {
            tracing::warn!("Dropping joined row {}: missing event_id", i + 1);
            continue;
        };
        records.push(EditionRecord {
            event_id,
            games_type,
            year,
            host,
            participants: opt_int(participants, i),
            participants_m: opt_int(male, i),
            participants_f: opt_int(female, i),
            events: opt_int(events, i),
            sports: opt_int(sports, i),
            countries: opt_int(countries, i),
        });
    }
    Ok(records)
}

fn check_gender_row(row: &GenderRow) -> Result<(), DataError> {
    if row.male < 0 || row.female < 0 {
        return Err(DataError::DataIntegrity("negative participant count".to_string()));
    }
    let reported = row.reported_total().ok_or_else(|| {
        DataError::DataIntegrity(format!(
            "male ({}) + female ({}) overflows",
            row.male, row.female
        ))
    })?;
    if reported == 0 {
        return Err(DataError::DataIntegrity("no participants with recorded gender".to_string()));
    }
    if let Some(total) = row.participants {
        if reported > total {
            return Err(DataError::DataIntegrity(format!(
                "male + female ({}) exceeds participants ({})",
                reported, total
            )));
        }
    }
    Ok(())
}

fn parse_coordinate(raw: Option<&str>, axis: &str, bound: f64) -> Result<f64, DataError> {
    let raw = raw.ok_or_else(|| DataError::DataIntegrity(format!("missing {}", axis)))?;
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| DataError::DataIntegrity(format!("{} '{}' is not a number", axis, raw)))?;
    if !value.is_finite() || value.abs() > bound {
        return Err(DataError::DataIntegrity(format!("{} {} out of range", axis, value)));
    }
    Ok(value)
}

fn to_year(raw: Option<i64>) -> Result<i32, DataError> {
    let raw = raw.ok_or_else(|| DataError::DataIntegrity("missing year".to_string()))?;
    i32::try_from(raw).map_err(|_| DataError::DataIntegrity(format!("year {} out of range", raw)))
}

fn int_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int64Array, DataError> {
    batch
        .column_by_name(name)
        .and_then(|col| col.as_any().downcast_ref::<Int64Array>())
        .ok_or_else(|| DataError::Schema(format!("expected integer column '{}'", name)))
}

fn str_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, DataError> {
    batch
        .column_by_name(name)
        .and_then(|col| col.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| DataError::Schema(format!("expected text column '{}'", name)))
}

fn opt_int(array: &Int64Array, i: usize) -> Option<i64> {
    if array.is_null(i) {
        None
    } else {
        Some(array.value(i))
    }
}

fn opt_str(array: &StringArray, i: usize) -> Option<&str> {
    if array.is_null(i) {
        None
    } else {
        Some(array.value(i))
    }
}
