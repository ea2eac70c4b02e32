//! Query locations.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{HazardError, HazardResult};

/// A caller-supplied location to query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPoint {
    /// Latitude in WGS84 degrees.
    pub lat: f64,
    /// Longitude in WGS84 degrees.
    pub lon: f64,
    /// Optional caller identifier, unique across an input set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
}

impl QueryPoint {
    /// Create a point without an identifier.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            location_id: None,
        }
    }

    /// Attach a location identifier.
    pub fn with_location_id(mut self, id: impl Into<String>) -> Self {
        self.location_id = Some(id.into());
        self
    }

    /// Check that the coordinates are finite and on the globe.
    pub fn validate(&self) -> HazardResult<()> {
        if !self.lat.is_finite() || !self.lon.is_finite() {
            return Err(HazardError::InvalidInput(format!(
                "non-finite coordinate ({}, {})",
                self.lat, self.lon
            )));
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(HazardError::InvalidInput(format!(
                "latitude {} outside [-90, 90]",
                self.lat
            )));
        }
        Ok(())
    }
}

/// Validate a whole input set.
///
/// Every point must be valid, and location ids, when present, must be unique.
/// Either all points carry an id or none do.
pub fn validate_points(points: &[QueryPoint]) -> HazardResult<()> {
    let mut seen = HashSet::with_capacity(points.len());
    let with_id = points.iter().filter(|p| p.location_id.is_some()).count();

    if with_id != 0 && with_id != points.len() {
        return Err(HazardError::InvalidInput(format!(
            "{} of {} points are missing a location_id",
            points.len() - with_id,
            points.len()
        )));
    }

    for (index, point) in points.iter().enumerate() {
        point
            .validate()
            .map_err(|e| HazardError::InvalidInput(format!("point {}: {}", index, e)))?;

        if let Some(id) = &point.location_id {
            if !seen.insert(id.as_str()) {
                return Err(HazardError::InvalidInput(format!(
                    "duplicate location_id '{}'",
                    id
                )));
            }
        }
    }

    Ok(())
}
