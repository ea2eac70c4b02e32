//! Grid cell rectangles.

use serde::{Deserialize, Serialize};

use crate::grid::normalize_lon;

/// Rectangle covered by one grid cell, in WGS84 degrees.
///
/// Containment follows the grid's own semantics: the lower and left edges
/// are closed, the upper and right edges are open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl CellBounds {
    /// Create a new rectangle from corner coordinates.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Square rectangle with the given lower-left corner and side length.
    pub fn from_lower_left(lat: f64, lon: f64, side: f64) -> Self {
        Self::new(lon, lat, lon + side, lat + side)
    }

    /// Bounding rectangle of a GeoJSON polygon ring (`[lon, lat]` pairs).
    pub fn from_ring(ring: &[[f64; 2]]) -> Option<Self> {
        let first = ring.first()?;
        let mut bounds = Self::new(first[0], first[1], first[0], first[1]);
        for [lon, lat] in ring.iter().copied() {
            bounds.min_lon = bounds.min_lon.min(lon);
            bounds.min_lat = bounds.min_lat.min(lat);
            bounds.max_lon = bounds.max_lon.max(lon);
            bounds.max_lat = bounds.max_lat.max(lat);
        }
        Some(bounds)
    }

    /// Width in degrees.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Height in degrees.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Area in square degrees.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Lower-left corner as `(lat, lon)`.
    pub fn lower_left(&self) -> (f64, f64) {
        (self.min_lat, self.min_lon)
    }

    /// Centre as `(lat, lon)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    /// Check if a point falls in this cell.
    ///
    /// The point's longitude is shifted by whole turns to the window starting
    /// at `min_lon`, so cells on either side of the antimeridian match points
    /// given in either longitude convention.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        if lat < self.min_lat || lat >= self.max_lat {
            return false;
        }
        let offset = normalize_lon(lon - self.min_lon + 180.0) + 180.0;
        offset >= 0.0 && offset < self.width()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_open_containment() {
        let cell = CellBounds::from_lower_left(10.0, 20.0, 0.5);
        assert!(cell.contains(10.0, 20.0));
        assert!(cell.contains(10.25, 20.25));
        assert!(!cell.contains(10.5, 20.25));
        assert!(!cell.contains(10.25, 20.5));
        assert!(!cell.contains(9.999, 20.25));
    }

    #[test]
    fn test_contains_across_longitude_conventions() {
        let cell = CellBounds::from_lower_left(0.0, 179.75, 0.25);
        assert!(cell.contains(0.1, 179.9));
        assert!(cell.contains(0.1, 179.9 - 360.0));
        assert!(!cell.contains(0.1, -179.9));
    }

    #[test]
    fn test_from_ring() {
        let ring = [
            [-80.25, 25.0],
            [-80.0, 25.0],
            [-80.0, 25.25],
            [-80.25, 25.25],
            [-80.25, 25.0],
        ];
        let bounds = CellBounds::from_ring(&ring).unwrap();
        assert_eq!(bounds, CellBounds::new(-80.25, 25.0, -80.0, 25.25));
        assert_eq!(bounds.lower_left(), (25.0, -80.25));
        assert!((bounds.area() - 0.0625).abs() < 1e-12);
    }

    #[test]
    fn test_from_empty_ring() {
        assert!(CellBounds::from_ring(&[]).is_none());
    }
}
