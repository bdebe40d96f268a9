//! Line chart: one feature over time, a line per games type

use indexmap::IndexMap;
use pd_core::{Feature, GamesType};
use pd_data::TimeseriesRow;

use crate::artifact::{LineChartSpec, LinePoint, LineSeries};

pub const LINE_CHART_ID: &str = "line-chart";

/// Group rows by games type and plot `feature` against year.
///
/// Series appear in the order their type first occurs in `rows`. Rows with
/// no value are skipped, and a type with no plottable rows gets no series.
pub fn build_line_chart(rows: &[TimeseriesRow], feature: Feature) -> LineChartSpec {
    let mut grouped: IndexMap<GamesType, Vec<LinePoint>> = IndexMap::new();
    for row in rows {
        let Some(value) = row.value else {
            continue;
        };
        grouped.entry(row.games_type).or_default().push(LinePoint {
            year: row.year,
            value,
            host: row.host.clone(),
        });
    }

    let series = grouped
        .into_iter()
        .map(|(games_type, mut points)| {
            points.sort_by(|a, b| a.year.cmp(&b.year).then_with(|| a.host.cmp(&b.host)));
            LineSeries {
                name: games_type.as_str().to_string(),
                games_type,
                points,
            }
        })
        .collect();

    LineChartSpec {
        id: LINE_CHART_ID.to_string(),
        title: format!("How has the number of {} changed over time?", feature),
        x_label: "Year".to_string(),
        y_label: feature.axis_label(),
        series,
    }
}
