//! Query point generators.
//!
//! Random generators take an explicit seed so that failures reproduce.

use hazard_common::grid::{cell_bounds, cell_id_from_row_col, cell_id_of, row_col_of};
use hazard_common::QueryPoint;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniformly random points inside a `(min_lon, min_lat, max_lon, max_lat)` box.
///
/// Points carry location ids `loc-0`, `loc-1`, ...
///
/// # Example
///
/// ```
/// use test_utils::{random_points_in_bbox, bbox};
///
/// let points = random_points_in_bbox(10, bbox::FLORIDA, 42);
/// assert_eq!(points.len(), 10);
/// assert_eq!(points[3].location_id.as_deref(), Some("loc-3"));
/// ```
pub fn random_points_in_bbox(n: usize, bbox: (f64, f64, f64, f64), seed: u64) -> Vec<QueryPoint> {
    let (min_lon, min_lat, max_lon, max_lat) = bbox;
    let mut rng = StdRng::seed_from_u64(seed);

    (0..n)
        .map(|i| {
            let lon = if max_lon > min_lon {
                rng.gen_range(min_lon..max_lon)
            } else {
                min_lon
            };
            let lat = if max_lat > min_lat {
                rng.gen_range(min_lat..max_lat)
            } else {
                min_lat
            };
            QueryPoint::new(lat, lon).with_location_id(format!("loc-{}", i))
        })
        .collect()
}

/// Centers of a `rows x cols` block of adjacent grid cells.
///
/// The block starts at the cell containing `(lat, lon)` and extends north
/// and east. Useful for building neighborhoods with known cell ids.
pub fn cell_center_block(lat: f64, lon: f64, rows: u32, cols: u32) -> Vec<QueryPoint> {
    let (row0, col0) = row_col_of(cell_id_of(lat, lon));
    let mut points = Vec::with_capacity((rows * cols) as usize);

    for r in 0..rows as i64 {
        for c in 0..cols as i64 {
            if let Some(id) = cell_id_from_row_col(row0 as i64 + r, col0 as i64 + c) {
                let (lat, lon) = cell_bounds(id).center();
                points.push(QueryPoint::new(lat, lon));
            }
        }
    }

    points
}

/// Random points guaranteed to fall in distinct grid cells.
pub fn random_points_distinct_cells(n: usize, bbox: (f64, f64, f64, f64), seed: u64) -> Vec<QueryPoint> {
    let mut seen = std::collections::HashSet::new();
    let mut points = Vec::with_capacity(n);
    let mut attempt = 0u64;

    while points.len() < n && attempt < 64 {
        for p in random_points_in_bbox(n, bbox, seed.wrapping_add(attempt)) {
            if points.len() < n && seen.insert(cell_id_of(p.lat, p.lon)) {
                let id = format!("loc-{}", points.len());
                points.push(QueryPoint::new(p.lat, p.lon).with_location_id(id));
            }
        }
        attempt += 1;
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::bbox;

    #[test]
    fn test_random_points_in_bbox() {
        let points = random_points_in_bbox(100, bbox::FLORIDA, 7);
        let (min_lon, min_lat, max_lon, max_lat) = bbox::FLORIDA;

        assert_eq!(points.len(), 100);
        for p in &points {
            assert!(p.lon >= min_lon && p.lon < max_lon);
            assert!(p.lat >= min_lat && p.lat < max_lat);
        }
    }

    #[test]
    fn test_random_points_reproducible() {
        assert_eq!(
            random_points_in_bbox(5, bbox::FLORIDA, 1),
            random_points_in_bbox(5, bbox::FLORIDA, 1)
        );
    }

    #[test]
    fn test_degenerate_bbox() {
        let points = random_points_in_bbox(3, bbox::POINT, 0);
        assert!(points.iter().all(|p| p.lat == 0.0 && p.lon == 0.0));
    }

    #[test]
    fn test_cell_center_block() {
        let points = cell_center_block(25.0, -80.0, 2, 3);
        assert_eq!(points.len(), 6);

        let ids: std::collections::HashSet<u64> =
            points.iter().map(|p| cell_id_of(p.lat, p.lon)).collect();
        assert_eq!(ids.len(), 6);
        assert_eq!(cell_id_of(points[0].lat, points[0].lon), cell_id_of(25.0, -80.0));
    }

    #[test]
    fn test_distinct_cells() {
        let points = random_points_distinct_cells(20, bbox::SMALL_BOX, 3);
        let ids: std::collections::HashSet<u64> =
            points.iter().map(|p| cell_id_of(p.lat, p.lon)).collect();
        assert_eq!(ids.len(), points.len());
    }
}
