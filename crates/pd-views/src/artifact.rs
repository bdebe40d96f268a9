//! Artifact shapes handed to the rendering collaborator

use pd_core::{GamesType, HostYear};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Output of one builder run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "spec", rename_all = "snake_case")]
pub enum Artifact {
    LineChart(LineChartSpec),
    /// One stacked ratio chart per selected games type, in selection order
    BarCharts(Vec<BarChartSpec>),
    GeoScatter(GeoScatterSpec),
    Card(DetailCard),
}

impl Artifact {
    pub fn kind(&self) -> &'static str {
        match self {
            Artifact::LineChart(_) => "line_chart",
            Artifact::BarCharts(_) => "bar_charts",
            Artifact::GeoScatter(_) => "geo_scatter",
            Artifact::Card(_) => "card",
        }
    }

    /// Serialise for the renderer
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinePoint {
    pub year: i32,
    pub value: i64,
    /// Shown on hover
    pub host: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub games_type: GamesType,
    pub points: Vec<LinePoint>,
}

/// Feature over time, one line per games type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineChartSpec {
    pub id: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<LineSeries>,
}

impl LineChartSpec {
    pub fn series_for(&self, games_type: GamesType) -> Option<&LineSeries> {
        self.series.iter().find(|s| s.games_type == games_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    pub name: String,
    /// One fraction per category, aligned with [`BarChartSpec::categories`]
    pub values: Vec<f64>,
}

/// Male/female share per edition of one games type, stacked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarChartSpec {
    pub id: String,
    pub games_type: GamesType,
    pub title: String,
    /// `"{host} {year}"`, ordered by year
    pub categories: Vec<String>,
    pub series: Vec<BarSeries>,
    pub stacked: bool,
    /// d3-format string for the y axis
    pub y_tick_format: String,
}

impl BarChartSpec {
    pub fn series_named(&self, name: &str) -> Option<&BarSeries> {
        self.series.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub label: String,
    /// Sent back as the hover control value when the pointer is over this point
    pub key: HostYear,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoScatterSpec {
    pub id: String,
    pub title: String,
    pub points: Vec<GeoPoint>,
}

/// Summary card for one edition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditionCard {
    pub title: String,
    pub host: String,
    pub year: i32,
    /// Asset path of the games logo
    pub logo: String,
    pub participants: Option<i64>,
    pub events: Option<i64>,
    pub countries: Option<i64>,
    pub sports: Option<i64>,
    /// Body lines in display order
    pub lines: Vec<String>,
}

/// Detail card slot contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DetailCard {
    Edition(EditionCard),
    NotFound { host: String, year: i32, message: String },
    /// Nothing is hovered
    NoSelection,
}

impl DetailCard {
    pub fn is_found(&self) -> bool {
        matches!(self, DetailCard::Edition(_))
    }
}
