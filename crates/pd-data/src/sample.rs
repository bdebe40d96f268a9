//! Bundled sample dataset
//!
//! Writes a small but realistic copy of both record sets: the flat CSV and
//! the normalized SQLite database. Used by `paradash --init-sample` and by
//! every data-bound test.

use std::fs::{self, File};
use std::path::Path;

use csv::Writer;
use pd_core::GamesType;
use rusqlite::{params, Connection};

use crate::config::SourceConfig;
use crate::schema::{FlatColumn, RELATIONAL_DDL};
use crate::DataError;

/// One edition as stored in both record sets
#[derive(Debug, Clone, Copy)]
pub struct SampleEdition {
    pub games_type: GamesType,
    pub year: i32,
    pub host: &'static str,
    pub latitude: &'static str,
    pub longitude: &'static str,
    pub participants: i64,
    pub participants_m: Option<i64>,
    pub participants_f: Option<i64>,
    pub events: i64,
    pub sports: i64,
    pub countries: i64,
}

#[allow(clippy::too_many_arguments)]
const fn edition(
    games_type: GamesType,
    year: i32,
    host: &'static str,
    coords: (&'static str, &'static str),
    participants: i64,
    gender: Option<(i64, i64)>,
    events: i64,
    sports: i64,
    countries: i64,
) -> SampleEdition {
    let (participants_m, participants_f) = match gender {
        Some((m, f)) => (Some(m), Some(f)),
        None => (None, None),
    };
    SampleEdition {
        games_type,
        year,
        host,
        latitude: coords.0,
        longitude: coords.1,
        participants,
        participants_m,
        participants_f,
        events,
        sports,
        countries,
    }
}

use pd_core::GamesType::{Summer, Winter};

/// The sample editions, in file order
pub const EDITIONS: &[SampleEdition] = &[
    edition(Summer, 1960, "Rome", ("41.9028", "12.4964"), 209, None, 57, 8, 23),
    edition(Summer, 1964, "Tokyo", ("35.6762", "139.6503"), 375, Some((301, 74)), 144, 9, 21),
    edition(Summer, 1968, "Tel Aviv", ("32.0853", "34.7818"), 750, Some((520, 230)), 181, 10, 29),
    edition(Summer, 1972, "Heidelberg", ("49.3988", "8.6724"), 984, Some((657, 327)), 187, 10, 43),
    edition(Winter, 1976, "Örnsköldsvik", ("63.2909", "18.7153"), 196, None, 53, 2, 16),
    edition(Summer, 1976, "Toronto", ("43.6532", "-79.3832"), 1657, Some((1404, 253)), 447, 13, 38),
    edition(Winter, 1980, "Geilo", ("60.5345", "8.2060"), 299, Some((229, 70)), 63, 3, 18),
    edition(Winter, 1984, "Innsbruck", ("47.2692", "11.4041"), 419, Some((325, 94)), 107, 3, 21),
    edition(Summer, 1988, "Seoul", ("37.5665", "126.9780"), 3057, Some((2503, 554)), 732, 17, 60),
    edition(Summer, 1992, "Barcelona", ("41.3874", "2.1686"), 3001, Some((2301, 700)), 487, 16, 82),
    edition(Summer, 1996, "Atlanta", ("33.7490", "-84.3880"), 3259, Some((2469, 790)), 508, 20, 104),
    edition(Winter, 1998, "Nagano", ("36.6485", "138.1942"), 571, Some((440, 131)), 122, 5, 31),
    edition(Summer, 2000, "Sydney", ("-33.8688", "151.2093"), 3881, Some((2891, 990)), 551, 18, 122),
    edition(Winter, 2002, "Salt Lake City", ("40.7608", "-111.8910"), 416, Some((329, 87)), 92, 4, 36),
    edition(Summer, 2004, "Athens", ("37.9838", "23.7275"), 3808, Some((2646, 1162)), 519, 19, 135),
    edition(Summer, 2008, "Beijing", ("39.9042", "116.4074"), 3951, Some((2568, 1383)), 472, 20, 146),
    edition(Winter, 2010, "Vancouver", ("49.2827", "-123.1207"), 502, Some((381, 121)), 64, 5, 44),
    edition(Summer, 2012, "London", ("51.5072", "-0.1276"), 4237, Some((2736, 1501)), 503, 20, 164),
    edition(Winter, 2014, "Sochi", ("43.6028", "39.7342"), 547, Some((413, 134)), 72, 5, 45),
    edition(Summer, 2016, "Rio de Janeiro", ("-22.9068", "-43.1729"), 4328, Some((2657, 1671)), 528, 22, 159),
    edition(Winter, 2018, "PyeongChang", ("37.3705", "128.3900"), 567, Some((434, 133)), 80, 6, 49),
    edition(Summer, 2020, "Tokyo", ("35.6762", "139.6503"), 4403, Some((2550, 1853)), 539, 22, 162),
    edition(Winter, 2022, "Beijing", ("39.9042", "116.4074"), 564, Some((426, 138)), 78, 6, 46),
];

/// Look up a sample edition by host and year
pub fn find(host: &str, year: i32) -> Option<&'static SampleEdition> {
    EDITIONS.iter().find(|e| e.host == host && e.year == year)
}

/// Write both record sets into `dir`, returning a config pointing at them
pub fn write_sample(dir: &Path) -> Result<SourceConfig, DataError> {
    fs::create_dir_all(dir)?;
    let config = SourceConfig::in_dir(dir);
    write_csv(&config.csv_path)?;
    write_database(&config.db_path)?;
    tracing::info!("Sample dataset written to {}", dir.display());
    Ok(config)
}

fn write_csv(path: &Path) -> Result<(), DataError> {
    let mut writer = Writer::from_writer(File::create(path)?);
    writer.write_record(FlatColumn::ALL.iter().map(FlatColumn::name))?;

    let optional = |value: Option<i64>| value.map(|v| v.to_string()).unwrap_or_default();
    for e in EDITIONS {
        writer.write_record([
            e.games_type.as_str().to_string(),
            e.year.to_string(),
            e.host.to_string(),
            e.sports.to_string(),
            e.participants.to_string(),
            e.events.to_string(),
            e.countries.to_string(),
            optional(e.participants_m),
            optional(e.participants_f),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_database(path: &Path) -> Result<(), DataError> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    let mut conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA foreign_keys = ON")?;
    conn.execute_batch(RELATIONAL_DDL)?;

    let tx = conn.transaction()?;
    {
        let mut insert_event = tx.prepare(
            "INSERT INTO event (event_id, type, year, participants, participants_m, participants_f, events, sports, countries)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        let mut insert_host =
            tx.prepare("INSERT INTO host (host, latitude, longitude) VALUES (?1, ?2, ?3)")?;
        let mut find_host = tx.prepare("SELECT host_id FROM host WHERE host = ?1")?;
        let mut link = tx.prepare("INSERT INTO host_event (event_id, host_id) VALUES (?1, ?2)")?;

        for (idx, e) in EDITIONS.iter().enumerate() {
            let event_id = idx as i64 + 1;
            insert_event.execute(params![
                event_id,
                e.games_type.as_str(),
                e.year,
                e.participants,
                e.participants_m,
                e.participants_f,
                e.events,
                e.sports,
                e.countries,
            ])?;

            // Cities that hosted twice share one host row
            let existing: Option<i64> = find_host
                .query_map(params![e.host], |row| row.get(0))?
                .next()
                .transpose()?;
            let host_id = match existing {
                Some(id) => id,
                None => {
                    insert_host.execute(params![e.host, e.latitude, e.longitude])?;
                    tx.last_insert_rowid()
                }
            };
            link.execute(params![event_id, host_id])?;
        }
    }
    tx.commit()?;
    Ok(())
}
