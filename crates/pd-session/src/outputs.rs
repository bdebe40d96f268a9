//! Output wiring
//!
//! Each output is a builder function plus the set of controls it reads. The
//! dispatcher only consults the dependency set, so adding an output is a
//! matter of adding a row to [`default_outputs`].

use std::fmt;
use std::str::FromStr;

use pd_core::{ControlId, ControlSnapshot};
use pd_data::{DataError, QueryLayer};
use pd_views::{
    build_geo_scatter, build_hover_card, build_line_chart, build_stacked_ratio_chart, Artifact,
};
use serde::{Deserialize, Serialize};

use crate::DispatchError;

/// A page element the dispatcher keeps up to date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputId {
    LineChart,
    BarCharts,
    Map,
    Card,
}

impl OutputId {
    pub const ALL: [OutputId; 4] = [
        OutputId::LineChart,
        OutputId::BarCharts,
        OutputId::Map,
        OutputId::Card,
    ];

    /// Element id on the page
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputId::LineChart => "line-chart",
            OutputId::BarCharts => "bar-div",
            OutputId::Map => "map",
            OutputId::Card => "card",
        }
    }
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputId {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        match wanted.as_str() {
            "line-chart" | "line" => Ok(OutputId::LineChart),
            "bar-div" | "bar-charts" | "bars" => Ok(OutputId::BarCharts),
            "map" => Ok(OutputId::Map),
            "card" => Ok(OutputId::Card),
            _ => Err(DispatchError::UnknownOutput(s.to_string())),
        }
    }
}

/// What a builder gets to work with: the full control state and the data
pub struct BuildContext<'a> {
    pub controls: &'a ControlSnapshot,
    pub queries: &'a QueryLayer,
}

pub type BuilderFn = fn(&BuildContext<'_>) -> Result<Artifact, DataError>;

/// One output as seen by the dispatcher
#[derive(Clone)]
pub struct OutputRegistration {
    pub id: OutputId,
    pub dependencies: &'static [ControlId],
    pub builder: BuilderFn,
}

impl fmt::Debug for OutputRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputRegistration")
            .field("id", &self.id)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

/// The dashboard's outputs in display order
pub fn default_outputs() -> Vec<OutputRegistration> {
    vec![
        OutputRegistration {
            id: OutputId::LineChart,
            dependencies: &[ControlId::Category],
            builder: line_chart,
        },
        OutputRegistration {
            id: OutputId::BarCharts,
            dependencies: &[ControlId::Types],
            builder: bar_charts,
        },
        OutputRegistration {
            id: OutputId::Map,
            dependencies: &[],
            builder: map,
        },
        OutputRegistration {
            id: OutputId::Card,
            dependencies: &[ControlId::Hover],
            builder: card,
        },
    ]
}

fn line_chart(ctx: &BuildContext<'_>) -> Result<Artifact, DataError> {
    let feature = ctx.controls.category;
    let rows = ctx.queries.fetch_timeseries(feature)?;
    Ok(Artifact::LineChart(build_line_chart(&rows, feature)))
}

fn bar_charts(ctx: &BuildContext<'_>) -> Result<Artifact, DataError> {
    let mut charts = Vec::with_capacity(ctx.controls.types.len());
    for games_type in ctx.controls.types.iter() {
        let rows = ctx.queries.fetch_gender_ratio(games_type)?;
        charts.push(build_stacked_ratio_chart(&rows, games_type));
    }
    Ok(Artifact::BarCharts(charts))
}

fn map(ctx: &BuildContext<'_>) -> Result<Artifact, DataError> {
    let rows = ctx.queries.fetch_locations()?;
    Ok(Artifact::GeoScatter(build_geo_scatter(&rows)))
}

fn card(ctx: &BuildContext<'_>) -> Result<Artifact, DataError> {
    let card = build_hover_card(ctx.queries, ctx.controls.hover.as_ref())?;
    Ok(Artifact::Card(card))
}
