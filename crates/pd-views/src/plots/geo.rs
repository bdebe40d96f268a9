//! Geographic scatter of host cities

use pd_data::LocationRow;

use crate::artifact::{GeoPoint, GeoScatterSpec};

pub const MAP_ID: &str = "map";

pub fn build_geo_scatter(rows: &[LocationRow]) -> GeoScatterSpec {
    let points = rows
        .iter()
        .map(|row| {
            let key = row.key();
            GeoPoint {
                latitude: row.latitude,
                longitude: row.longitude,
                label: key.label(),
                key,
            }
        })
        .collect();

    GeoScatterSpec {
        id: MAP_ID.to_string(),
        title: "Where have the paralympics been held?".to_string(),
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_core::HostYear;

    #[test]
    fn test_one_point_per_row() {
        let rows = vec![
            LocationRow {
                host: "Sydney".to_string(),
                year: 2000,
                latitude: -33.8688,
                longitude: 151.2093,
            },
            LocationRow {
                host: "Salt Lake City".to_string(),
                year: 2002,
                latitude: 40.7608,
                longitude: -111.891,
            },
        ];
        let spec = build_geo_scatter(&rows);

        assert_eq!(spec.points.len(), 2);
        assert_eq!(spec.points[1].label, "Salt Lake City 2002");
        assert_eq!(spec.points[1].key, HostYear::new("Salt Lake City", 2002));
        assert_eq!(spec.points[0].latitude, -33.8688);
    }
}
