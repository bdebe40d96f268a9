//! Stacked bar chart of the female:male participant ratio

use pd_core::GamesType;
use pd_data::GenderRow;

use crate::artifact::{BarChartSpec, BarSeries};

pub const MALE_SERIES: &str = "Male";
pub const FEMALE_SERIES: &str = "Female";

/// Id of the chart for one games type, e.g. `bar-chart-winter`
pub fn bar_chart_id(games_type: GamesType) -> String {
    format!("bar-chart-{}", games_type)
}

/// Male and female share per edition of `games_type`, ordered by year.
///
/// Shares are taken over the participants whose gender is recorded, so the
/// two bars of every edition add up to one.
pub fn build_stacked_ratio_chart(rows: &[GenderRow], games_type: GamesType) -> BarChartSpec {
    let mut selected: Vec<(&GenderRow, i64)> = rows
        .iter()
        .filter(|row| row.games_type == games_type)
        .filter_map(|row| row.reported_total().filter(|total| *total > 0).map(|total| (row, total)))
        .collect();
    selected.sort_by(|(a, _), (b, _)| a.year.cmp(&b.year).then_with(|| a.host.cmp(&b.host)));

    let mut categories = Vec::with_capacity(selected.len());
    let mut male = Vec::with_capacity(selected.len());
    let mut female = Vec::with_capacity(selected.len());
    for (row, total) in selected {
        let total = total as f64;
        categories.push(row.label());
        male.push(row.male as f64 / total);
        female.push(row.female as f64 / total);
    }

    BarChartSpec {
        id: bar_chart_id(games_type),
        games_type,
        title: format!(
            "How has the ratio of female:male participants changed in {} paralympics?",
            games_type
        ),
        categories,
        series: vec![
            BarSeries {
                name: MALE_SERIES.to_string(),
                values: male,
            },
            BarSeries {
                name: FEMALE_SERIES.to_string(),
                values: female,
            },
        ],
        stacked: true,
        y_tick_format: ".0%".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(games_type: GamesType, year: i32, host: &str, male: i64, female: i64) -> GenderRow {
        GenderRow {
            games_type,
            year,
            host: host.to_string(),
            participants: male.checked_add(female),
            male,
            female,
        }
    }

    #[test]
    fn test_fractions_decompose_exactly() {
        let rows = vec![
            row(GamesType::Summer, 2000, "Sydney", 2891, 990),
            row(GamesType::Summer, 1964, "Tokyo", 301, 74),
        ];
        let chart = build_stacked_ratio_chart(&rows, GamesType::Summer);

        assert_eq!(chart.categories, vec!["Tokyo 1964", "Sydney 2000"]);
        let male = &chart.series_named(MALE_SERIES).unwrap().values;
        let female = &chart.series_named(FEMALE_SERIES).unwrap().values;
        for (m, f) in male.iter().zip(female) {
            assert!((m + f - 1.0).abs() < 1e-9);
        }
        assert!((male[0] - 301.0 / 375.0).abs() < 1e-12);
    }

    #[test]
    fn test_filters_to_requested_type() {
        let rows = vec![
            row(GamesType::Summer, 2000, "Sydney", 2891, 990),
            row(GamesType::Winter, 2002, "Salt Lake City", 329, 87),
        ];
        let chart = build_stacked_ratio_chart(&rows, GamesType::Winter);

        assert_eq!(chart.id, "bar-chart-winter");
        assert_eq!(chart.categories, vec!["Salt Lake City 2002"]);
        assert!(chart.stacked);
        assert_eq!(chart.y_tick_format, ".0%");
        assert!(chart.title.contains("winter paralympics"));
    }

    #[test]
    fn test_fractions_decompose_for_every_fetched_row() {
        let dir = tempfile::tempdir().unwrap();
        let config = pd_data::sample::write_sample(dir.path()).unwrap();
        let layer = pd_data::QueryLayer::from_config(&config);

        for games_type in GamesType::ALL {
            let rows = layer.fetch_gender_ratio(games_type).unwrap();
            assert!(!rows.is_empty());
            let chart = build_stacked_ratio_chart(&rows, games_type);
            assert_eq!(chart.categories.len(), rows.len());

            let male = &chart.series_named(MALE_SERIES).unwrap().values;
            let female = &chart.series_named(FEMALE_SERIES).unwrap().values;
            assert_eq!(male.len(), rows.len());
            for (i, (m, f)) in male.iter().zip(female).enumerate() {
                assert!((m + f - 1.0).abs() < 1e-9, "{} {}", games_type, chart.categories[i]);
            }
        }
    }

    #[test]
    fn test_overflowing_rows_are_skipped() {
        let rows = vec![
            row(GamesType::Summer, 1964, "Tokyo", i64::MAX, 1),
            row(GamesType::Summer, 2000, "Sydney", 2891, 990),
        ];
        let chart = build_stacked_ratio_chart(&rows, GamesType::Summer);
        assert_eq!(chart.categories, vec!["Sydney 2000"]);
    }

    #[test]
    fn test_zero_total_rows_are_skipped() {
        let rows = vec![row(GamesType::Winter, 1976, "Örnsköldsvik", 0, 0)];
        let chart = build_stacked_ratio_chart(&rows, GamesType::Winter);
        assert!(chart.categories.is_empty());
        assert!(chart.series.iter().all(|s| s.values.is_empty()));
    }
}
