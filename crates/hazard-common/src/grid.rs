//! Global hazard grid addressing.
//!
//! The hazard grid is a regular lat/lon grid with square cells of
//! [`RESOLUTION_DEG`] degrees. Cells are numbered row-major starting at the
//! south pole and the prime meridian:
//!
//! ```text
//! id = row * NUM_COLUMNS + col
//! row = floor((lat + 90) / R)
//! col = floor((lon mod 360) / R)
//! ```
//!
//! `R` is a dyadic rational (5 * 2^-9), so multiples of it are exact in
//! binary floating point and the id <-> lower-left corner mapping round-trips
//! without error.

use crate::bounds::CellBounds;

/// Cell side length in degrees (2^-7 + 2^-9, about 1.09 km at the equator).
pub const RESOLUTION_DEG: f64 = 1.0 / 128.0 + 1.0 / 512.0;

/// Number of cells around a parallel.
pub const NUM_COLUMNS: u64 = (360.0 / RESOLUTION_DEG) as u64;

/// Number of cells from pole to pole.
pub const NUM_ROWS: u64 = (180.0 / RESOLUTION_DEG) as u64;

/// Cell id containing the given point.
///
/// Longitude wraps modulo 360 before indexing. Latitude is clamped to the
/// grid so that the north pole falls into the last row.
pub fn cell_id_of(lat: f64, lon: f64) -> u64 {
    let (row, col) = row_col_of_point(lat, lon);
    row * NUM_COLUMNS + col
}

/// Lower-left corner `(lat, lon)` of the cell with the given id.
///
/// Longitude is returned in `[-180, 180)`.
pub fn lower_left_of(id: u64) -> (f64, f64) {
    let (row, col) = row_col_of(id);

    let left_lon = (col as f64 * RESOLUTION_DEG + 180.0).rem_euclid(360.0) - 180.0;
    let lower_lat = row as f64 * RESOLUTION_DEG - 90.0;

    (lower_lat, left_lon)
}

/// Split a cell id into `(row, col)`.
pub fn row_col_of(id: u64) -> (u64, u64) {
    (id / NUM_COLUMNS, id % NUM_COLUMNS)
}

/// Build a cell id from signed `(row, col)` indices.
///
/// Columns wrap around the antimeridian; rows outside the grid return `None`.
pub fn cell_id_from_row_col(row: i64, col: i64) -> Option<u64> {
    if row < 0 || row >= NUM_ROWS as i64 {
        return None;
    }
    let col = col.rem_euclid(NUM_COLUMNS as i64) as u64;
    Some(row as u64 * NUM_COLUMNS + col)
}

/// Rectangle covered by the cell with the given id.
pub fn cell_bounds(id: u64) -> CellBounds {
    let (lat, lon) = lower_left_of(id);
    CellBounds::from_lower_left(lat, lon, RESOLUTION_DEG)
}

/// Wrap a longitude into `[-180, 180)`.
pub fn normalize_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

fn row_col_of_point(lat: f64, lon: f64) -> (u64, u64) {
    // `as u64` saturates negative values to zero
    let row = (((lat + 90.0) / RESOLUTION_DEG).floor() as u64).min(NUM_ROWS - 1);
    let col = ((lon.rem_euclid(360.0) / RESOLUTION_DEG).floor() as u64) % NUM_COLUMNS;
    (row, col)
}
