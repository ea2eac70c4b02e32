//! Location table input.
//!
//! Locations come from a CSV file whose coordinate columns may use any of a
//! few common names, or from paired coordinate lists on the command line.

use std::io::Read;

use hazard_common::{validate_points, HazardError, HazardResult, QueryPoint};
use tracing::debug;

/// Accepted latitude column names, compared case-insensitively.
pub const LATITUDE_ALIASES: &[&str] = &["latitude", "lat"];

/// Accepted longitude column names, compared case-insensitively.
pub const LONGITUDE_ALIASES: &[&str] = &["longitude", "lon"];

/// Accepted location id column names, compared case-insensitively.
pub const LOCATION_ID_ALIASES: &[&str] = &["location_id", "locationid", "id"];

/// Index of the first header matching one of `aliases`.
fn find_column(headers: &[String], aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|alias| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(alias))
    })
}

fn parse_coordinate(value: &str, column: &str, line: usize) -> HazardResult<f64> {
    let parsed: f64 = value.trim().parse().map_err(|_| {
        HazardError::InvalidInput(format!(
            "line {}: cannot parse {} '{}'",
            line, column, value
        ))
    })?;
    if !parsed.is_finite() {
        return Err(HazardError::InvalidInput(format!(
            "line {}: {} '{}' is not finite",
            line, column, value
        )));
    }
    Ok(parsed)
}

/// Read query points from CSV data with a header row.
///
/// Extra columns are ignored. Empty location ids count as missing, which
/// [`validate_points`] rejects unless every id is missing.
pub fn read_locations<R: Read>(reader: R) -> HazardResult<Vec<QueryPoint>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| HazardError::InvalidInput(format!("failed to read CSV header: {}", e)))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let lat_idx = find_column(&headers, LATITUDE_ALIASES).ok_or_else(|| {
        HazardError::InvalidInput(format!(
            "no latitude column, expected one of {:?}, found {:?}",
            LATITUDE_ALIASES, headers
        ))
    })?;
    let lon_idx = find_column(&headers, LONGITUDE_ALIASES).ok_or_else(|| {
        HazardError::InvalidInput(format!(
            "no longitude column, expected one of {:?}, found {:?}",
            LONGITUDE_ALIASES, headers
        ))
    })?;
    let id_idx = find_column(&headers, LOCATION_ID_ALIASES);

    let mut points = Vec::new();
    for (i, record) in reader.records().enumerate() {
        // header is line 1
        let line = i + 2;
        let record = record
            .map_err(|e| HazardError::InvalidInput(format!("line {}: {}", line, e)))?;

        let field = |idx: usize, column: &str| {
            record.get(idx).ok_or_else(|| {
                HazardError::InvalidInput(format!("line {}: missing {} field", line, column))
            })
        };

        let lat = parse_coordinate(field(lat_idx, "latitude")?, "latitude", line)?;
        let lon = parse_coordinate(field(lon_idx, "longitude")?, "longitude", line)?;

        let mut point = QueryPoint::new(lat, lon);
        if let Some(id) = id_idx.and_then(|idx| record.get(idx)).map(str::trim) {
            if !id.is_empty() {
                point = point.with_location_id(id);
            }
        }
        points.push(point);
    }

    validate_points(&points)?;
    debug!(
        points = points.len(),
        with_ids = id_idx.is_some(),
        "Read location table"
    );
    Ok(points)
}

/// Query points from paired coordinate lists.
pub fn points_from_lists(latitudes: &[f64], longitudes: &[f64]) -> HazardResult<Vec<QueryPoint>> {
    if latitudes.len() != longitudes.len() {
        return Err(HazardError::InvalidInput(format!(
            "got {} latitudes but {} longitudes",
            latitudes.len(),
            longitudes.len()
        )));
    }

    let points: Vec<QueryPoint> = latitudes
        .iter()
        .zip(longitudes)
        .map(|(&lat, &lon)| QueryPoint::new(lat, lon))
        .collect();

    validate_points(&points)?;
    Ok(points)
}
