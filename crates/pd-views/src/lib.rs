//! Chart and card builders for the paralympics dashboard
//!
//! Every builder is a pure function of its rows and parameters: same input,
//! same artifact. The detail card is the one exception that reads data, and
//! it does so only through the [`pd_data::EditionLookup`] seam.

mod artifact;
mod card;
pub mod plots;

pub use artifact::{
    Artifact, BarChartSpec, BarSeries, DetailCard, EditionCard, GeoPoint, GeoScatterSpec, LineChartSpec,
    LinePoint, LineSeries,
};
pub use card::{build_detail_card, build_detail_card_from_label, build_hover_card, card_from_record};
pub use plots::{build_geo_scatter, build_line_chart, build_stacked_ratio_chart};
