//! Plot builders

pub mod bar;
pub mod geo;
pub mod line;

// Re-exports
pub use bar::build_stacked_ratio_chart;
pub use geo::build_geo_scatter;
pub use line::build_line_chart;
