//! Typed rows returned by the query layer

use pd_core::{GamesType, HostYear};
use serde::{Deserialize, Serialize};

/// One edition's value for a line-chart feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeseriesRow {
    pub games_type: GamesType,
    pub year: i32,
    pub host: String,
    /// `None` when the source has no value for this edition
    pub value: Option<i64>,
}

/// Male/female participant counts for one edition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenderRow {
    pub games_type: GamesType,
    pub year: i32,
    pub host: String,
    pub participants: Option<i64>,
    pub male: i64,
    pub female: i64,
}

impl GenderRow {
    /// Participants whose gender is recorded; `None` if the sum overflows
    pub fn reported_total(&self) -> Option<i64> {
        self.male.checked_add(self.female)
    }

    pub fn label(&self) -> String {
        format!("{} {}", self.host, self.year)
    }
}

/// Where one edition was held
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRow {
    pub host: String,
    pub year: i32,
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationRow {
    pub fn key(&self) -> HostYear {
        HostYear::new(self.host.clone(), self.year)
    }
}

/// Full joined record for one edition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditionRecord {
    pub event_id: i64,
    pub games_type: GamesType,
    pub year: i32,
    pub host: String,
    pub participants: Option<i64>,
    pub participants_m: Option<i64>,
    pub participants_f: Option<i64>,
    pub events: Option<i64>,
    pub sports: Option<i64>,
    pub countries: Option<i64>,
}

impl EditionRecord {
    pub fn key(&self) -> HostYear {
        HostYear::new(self.host.clone(), self.year)
    }
}
