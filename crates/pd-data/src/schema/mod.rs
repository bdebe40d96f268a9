//! Fixed schemas of the flat record set and of the relational join

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use pd_core::Feature;

use crate::DataError;

/// Column of the flat per-edition record set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlatColumn {
    Type,
    Year,
    Host,
    Sports,
    Participants,
    Events,
    Countries,
    ParticipantsM,
    ParticipantsF,
}

impl FlatColumn {
    pub const ALL: [FlatColumn; 9] = [
        FlatColumn::Type,
        FlatColumn::Year,
        FlatColumn::Host,
        FlatColumn::Sports,
        FlatColumn::Participants,
        FlatColumn::Events,
        FlatColumn::Countries,
        FlatColumn::ParticipantsM,
        FlatColumn::ParticipantsF,
    ];

    /// Header name in the CSV file
    pub fn name(&self) -> &'static str {
        match self {
            FlatColumn::Type => "type",
            FlatColumn::Year => "year",
            FlatColumn::Host => "host",
            FlatColumn::Sports => "sports",
            FlatColumn::Participants => "participants",
            FlatColumn::Events => "events",
            FlatColumn::Countries => "countries",
            FlatColumn::ParticipantsM => "participants_m",
            FlatColumn::ParticipantsF => "participants_f",
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            FlatColumn::Type | FlatColumn::Host => DataType::Utf8,
            _ => DataType::Int64,
        }
    }

    /// Column holding the values of a line-chart feature
    pub fn for_feature(feature: Feature) -> Self {
        match feature {
            Feature::Events => FlatColumn::Events,
            Feature::Sports => FlatColumn::Sports,
            Feature::Countries => FlatColumn::Countries,
            Feature::Participants => FlatColumn::Participants,
        }
    }

    pub fn field(&self) -> Field {
        Field::new(self.name(), self.data_type(), true)
    }
}

impl fmt::Display for FlatColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FlatColumn {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FlatColumn::ALL
            .into_iter()
            .find(|column| column.name() == s)
            .ok_or_else(|| DataError::InvalidParameter(format!("unknown column '{}'", s)))
    }
}

/// Schema of a flat read restricted to `columns`, in the order given
pub fn flat_schema(columns: &[FlatColumn]) -> SchemaRef {
    Arc::new(Schema::new(columns.iter().map(FlatColumn::field).collect::<Vec<_>>()))
}

/// Columns produced by the `event ⋈ host_event ⋈ host` join, with their
/// source expression. Coordinates stay text exactly as stored.
pub const JOINED_COLUMNS: [(&str, &str, JoinedType); 12] = [
    ("event_id", "event.event_id", JoinedType::Integer),
    ("type", "event.type", JoinedType::Text),
    ("year", "event.year", JoinedType::Integer),
    ("host", "host.host", JoinedType::Text),
    ("participants", "event.participants", JoinedType::Integer),
    ("participants_m", "event.participants_m", JoinedType::Integer),
    ("participants_f", "event.participants_f", JoinedType::Integer),
    ("events", "event.events", JoinedType::Integer),
    ("sports", "event.sports", JoinedType::Integer),
    ("countries", "event.countries", JoinedType::Integer),
    ("latitude", "host.latitude", JoinedType::Text),
    ("longitude", "host.longitude", JoinedType::Text),
];

/// Storage class of a joined column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinedType {
    Integer,
    Text,
}

impl JoinedType {
    pub fn data_type(&self) -> DataType {
        match self {
            JoinedType::Integer => DataType::Int64,
            JoinedType::Text => DataType::Utf8,
        }
    }
}

pub fn joined_schema() -> SchemaRef {
    Arc::new(Schema::new(
        JOINED_COLUMNS
            .iter()
            .map(|(name, _, ty)| Field::new(*name, ty.data_type(), true))
            .collect::<Vec<_>>(),
    ))
}

/// DDL for the relational record sets
pub const RELATIONAL_DDL: &str = "
    CREATE TABLE IF NOT EXISTS event (
        event_id INTEGER PRIMARY KEY,
        type TEXT NOT NULL,
        year INTEGER NOT NULL,
        participants INTEGER,
        participants_m INTEGER,
        participants_f INTEGER,
        events INTEGER,
        sports INTEGER,
        countries INTEGER
    );

    CREATE TABLE IF NOT EXISTS host (
        host_id INTEGER PRIMARY KEY,
        host TEXT NOT NULL,
        latitude TEXT,
        longitude TEXT
    );

    CREATE TABLE IF NOT EXISTS host_event (
        event_id INTEGER NOT NULL REFERENCES event(event_id),
        host_id INTEGER NOT NULL REFERENCES host(host_id)
    );
";
