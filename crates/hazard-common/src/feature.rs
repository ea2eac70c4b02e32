//! Hazard features returned by the remote service.

use serde::{Deserialize, Serialize};

use crate::bounds::CellBounds;
use crate::error::{HazardError, HazardResult};
use crate::grid;
use crate::query::{AveragingPeriod, ServiceRequest, TerrainCorrection};

/// Per-feature data availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FeatureStatus {
    #[default]
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "NO CONTENT")]
    NoContent,
}

impl FeatureStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::NoContent => "NO CONTENT",
        }
    }
}

/// Query parameters echoed back with every feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEcho {
    pub terrain_correction: TerrainCorrection,
    pub averaging_period: AveragingPeriod,
    pub scenario: String,
    pub time_horizon: String,
}

impl QueryEcho {
    /// Echo of the parameters a request was sent with.
    pub fn from_request(request: &ServiceRequest) -> Self {
        Self {
            terrain_correction: request.terrain_correction,
            averaging_period: request.averaging_period,
            scenario: request.scenario.clone(),
            time_horizon: request.time_horizon.clone(),
        }
    }
}

/// One row of a remote response: a grid cell and its hazard values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardFeature {
    pub cell_id: u64,
    pub bounds: CellBounds,
    /// Hazard value; `None` when the service has no data for the cell.
    pub wind_speed: Option<f64>,
    pub status: FeatureStatus,
    pub return_period: Option<u32>,
    /// Event identity, present on full-history rows.
    pub event_id: Option<String>,
    pub storm_name: Option<String>,
    pub storm_year: Option<i32>,
    pub echo: QueryEcho,
}

impl HazardFeature {
    /// Placeholder for a cell the service returned nothing for.
    pub fn no_content(cell_id: u64, echo: QueryEcho, return_period: Option<u32>) -> Self {
        Self {
            cell_id,
            bounds: grid::cell_bounds(cell_id),
            wind_speed: None,
            status: FeatureStatus::NoContent,
            return_period,
            event_id: None,
            storm_name: None,
            storm_year: None,
            echo,
        }
    }

    /// Whether this row carries a usable hazard value.
    pub fn has_value(&self) -> bool {
        self.status == FeatureStatus::Ok && self.wind_speed.is_some()
    }
}

/// Response header echoing the query the service actually answered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseHeader {
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub terrain_correction: Option<String>,
    #[serde(default)]
    pub wind_speed_averaging_period: Option<String>,
    #[serde(default)]
    pub scenario: Option<String>,
    #[serde(default)]
    pub time_horizon: Option<String>,
    #[serde(default)]
    pub simulation_years: Option<u64>,
    #[serde(default)]
    pub wind_speed_units: Option<String>,
}

impl ResponseHeader {
    /// Check that the service answered the question that was asked.
    ///
    /// Terrain correction and averaging period must always be echoed. The
    /// remaining fields are compared when the service reports them.
    pub fn verify_against(&self, request: &ServiceRequest) -> HazardResult<()> {
        if let Some(product) = &self.product {
            let expected = request.product.as_str();
            if !product.to_lowercase().contains(&expected.to_lowercase()) {
                return Err(HazardError::header_mismatch("product", expected, product));
            }
        }

        require_echo(
            "terrain_correction",
            request.terrain_correction.as_str(),
            self.terrain_correction.as_deref(),
        )?;
        require_echo(
            "wind_speed_averaging_period",
            request.averaging_period.as_str(),
            self.wind_speed_averaging_period.as_deref(),
        )?;

        optional_echo("scenario", &request.scenario, self.scenario.as_deref())?;
        optional_echo("time_horizon", &request.time_horizon, self.time_horizon.as_deref())?;
        optional_echo(
            "wind_speed_units",
            request.wind_speed_units.as_str(),
            self.wind_speed_units.as_deref(),
        )?;

        Ok(())
    }
}

fn require_echo(field: &str, expected: &str, actual: Option<&str>) -> HazardResult<()> {
    match actual {
        Some(actual) if actual == expected => Ok(()),
        Some(actual) => Err(HazardError::header_mismatch(field, expected, actual)),
        None => Err(HazardError::header_mismatch(field, expected, "<missing>")),
    }
}

fn optional_echo(field: &str, expected: &str, actual: Option<&str>) -> HazardResult<()> {
    match actual {
        Some(actual) if actual != expected => {
            Err(HazardError::header_mismatch(field, expected, actual))
        }
        _ => Ok(()),
    }
}

/// A full remote response for one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HazardResponse {
    pub header: ResponseHeader,
    pub features: Vec<HazardFeature>,
}
