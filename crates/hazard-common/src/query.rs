//! Hazard query configuration.
//!
//! [`HazardQuery`] is what the caller asks for. [`ServiceRequest`] is what is
//! actually sent to the remote service: the two differ when a derived
//! averaging period has to be computed locally.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{HazardError, HazardResult};

/// Hazard product served by the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Product {
    /// Stochastic event catalogue with return-period statistics.
    #[default]
    DeepCyc,
    /// Historical event reconstructions.
    Metryc,
}

impl Product {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeepCyc => "DeepCyc",
            Self::Metryc => "Metryc",
        }
    }

    /// Lower-case path segment used in endpoint URLs.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::DeepCyc => "deepcyc",
            Self::Metryc => "metryc",
        }
    }
}

impl FromStr for Product {
    type Err = HazardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deepcyc" => Ok(Self::DeepCyc),
            "metryc" => Ok(Self::Metryc),
            other => Err(HazardError::invalid_parameter(
                "product",
                format!("unknown product '{}', expected DeepCyc or Metryc", other),
            )),
        }
    }
}

/// Surface roughness correction applied to wind speeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TerrainCorrection {
    #[default]
    FullTerrainGust,
    OpenWater,
    OpenTerrain,
    AllOpenTerrain,
}

impl TerrainCorrection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullTerrainGust => "full_terrain_gust",
            Self::OpenWater => "open_water",
            Self::OpenTerrain => "open_terrain",
            Self::AllOpenTerrain => "all_open_terrain",
        }
    }
}

impl FromStr for TerrainCorrection {
    type Err = HazardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full_terrain_gust" | "ft_gust" => Ok(Self::FullTerrainGust),
            "open_water" | "ow" => Ok(Self::OpenWater),
            "open_terrain" | "ot" => Ok(Self::OpenTerrain),
            "all_open_terrain" | "aot" => Ok(Self::AllOpenTerrain),
            other => Err(HazardError::invalid_parameter(
                "terrain_correction",
                format!("unknown terrain correction '{}'", other),
            )),
        }
    }
}

/// Wind speed averaging period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AveragingPeriod {
    #[default]
    #[serde(rename = "3_seconds")]
    ThreeSeconds,
    #[serde(rename = "1_minute")]
    OneMinute,
    /// Not served remotely; derived from `1_minute` over open water.
    #[serde(rename = "10_minutes")]
    TenMinutes,
}

impl AveragingPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThreeSeconds => "3_seconds",
            Self::OneMinute => "1_minute",
            Self::TenMinutes => "10_minutes",
        }
    }
}

impl FromStr for AveragingPeriod {
    type Err = HazardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "3_seconds" => Ok(Self::ThreeSeconds),
            "1_minute" => Ok(Self::OneMinute),
            "10_minutes" => Ok(Self::TenMinutes),
            other => Err(HazardError::invalid_parameter(
                "wind_speed_averaging_period",
                format!("unknown averaging period '{}'", other),
            )),
        }
    }
}

/// Units for returned wind speeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WindSpeedUnits {
    #[default]
    Kph,
    Mph,
    Kts,
    Ms,
}

impl WindSpeedUnits {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kph => "kph",
            Self::Mph => "mph",
            Self::Kts => "kts",
            Self::Ms => "ms",
        }
    }
}

impl FromStr for WindSpeedUnits {
    type Err = HazardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kph" => Ok(Self::Kph),
            "mph" => Ok(Self::Mph),
            "kts" => Ok(Self::Kts),
            "ms" => Ok(Self::Ms),
            other => Err(HazardError::invalid_parameter(
                "wind_speed_units",
                format!("unknown units '{}'", other),
            )),
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),+) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.as_str())
                }
            }
        )+
    };
}

display_as_str!(Product, TerrainCorrection, AveragingPeriod, WindSpeedUnits);

/// Cost profile of a query on the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Every point expands into its whole event history.
    FullHistory,
    /// One bounded value per point (explicit return period).
    FixedValue,
}

/// Remote endpoint family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `tcwind/returnvalues`
    ReturnValues,
    /// `tcwind/events`
    Events,
}

impl Endpoint {
    pub fn path(&self, product: Product) -> String {
        match self {
            Self::ReturnValues => format!("{}/tcwind/returnvalues", product.path_segment()),
            Self::Events => format!("{}/tcwind/events", product.path_segment()),
        }
    }
}

fn default_scenario() -> String {
    "current_climate".to_string()
}

fn default_time_horizon() -> String {
    "now".to_string()
}

/// What the caller wants to know at every location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardQuery {
    #[serde(default)]
    pub product: Product,

    #[serde(default)]
    pub terrain_correction: TerrainCorrection,

    #[serde(default, rename = "wind_speed_averaging_period")]
    pub averaging_period: AveragingPeriod,

    #[serde(default = "default_scenario")]
    pub scenario: String,

    #[serde(default = "default_time_horizon")]
    pub time_horizon: String,

    /// Fixed return period in years. `None` requests the full event history.
    #[serde(default)]
    pub return_period: Option<u32>,

    #[serde(default)]
    pub wind_speed_units: WindSpeedUnits,

    /// Value for the `product-version` request header.
    #[serde(default)]
    pub product_version: Option<String>,
}

impl Default for HazardQuery {
    fn default() -> Self {
        Self {
            product: Product::default(),
            terrain_correction: TerrainCorrection::default(),
            averaging_period: AveragingPeriod::default(),
            scenario: default_scenario(),
            time_horizon: default_time_horizon(),
            return_period: None,
            wind_speed_units: WindSpeedUnits::default(),
            product_version: None,
        }
    }
}

impl HazardQuery {
    /// Validate the query once, before any remote call.
    pub fn validate(&self) -> HazardResult<()> {
        if let Some(rp) = self.return_period {
            if rp == 0 {
                return Err(HazardError::invalid_parameter(
                    "return_period",
                    "must be a positive number of years",
                ));
            }
            if self.product == Product::Metryc {
                return Err(HazardError::invalid_parameter(
                    "return_period",
                    "Metryc is a historical product and has no return periods",
                ));
            }
        }

        if self.averaging_period == AveragingPeriod::TenMinutes
            && self.terrain_correction != TerrainCorrection::OpenWater
        {
            return Err(HazardError::invalid_parameter(
                "wind_speed_averaging_period",
                "10_minutes is only available with terrain_correction=open_water",
            ));
        }

        if self.scenario.trim().is_empty() {
            return Err(HazardError::invalid_parameter("scenario", "must not be empty"));
        }
        if self.time_horizon.trim().is_empty() {
            return Err(HazardError::invalid_parameter(
                "time_horizon",
                "must not be empty",
            ));
        }

        Ok(())
    }

    /// Cost profile of this query.
    pub fn kind(&self) -> QueryKind {
        if self.return_period.is_some() {
            QueryKind::FixedValue
        } else {
            QueryKind::FullHistory
        }
    }

    /// Whether results must be converted from `1_minute` to `10_minutes` locally.
    pub fn needs_ten_minute_conversion(&self) -> bool {
        self.averaging_period == AveragingPeriod::TenMinutes
    }

    /// The request actually sent to the remote service.
    pub fn service_request(&self) -> ServiceRequest {
        let averaging_period = match self.averaging_period {
            AveragingPeriod::TenMinutes => AveragingPeriod::OneMinute,
            other => other,
        };

        let endpoint = if self.return_period.is_some() {
            Endpoint::ReturnValues
        } else {
            Endpoint::Events
        };

        ServiceRequest {
            product: self.product,
            endpoint,
            terrain_correction: self.terrain_correction,
            averaging_period,
            scenario: self.scenario.clone(),
            time_horizon: self.time_horizon.clone(),
            return_period: self.return_period,
            wind_speed_units: self.wind_speed_units,
            product_version: self.product_version.clone(),
        }
    }
}

/// Parameters of one remote call, excluding the points themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRequest {
    pub product: Product,
    pub endpoint: Endpoint,
    pub terrain_correction: TerrainCorrection,
    pub averaging_period: AveragingPeriod,
    pub scenario: String,
    pub time_horizon: String,
    pub return_period: Option<u32>,
    pub wind_speed_units: WindSpeedUnits,
    pub product_version: Option<String>,
}

impl ServiceRequest {
    /// Query-string parameters other than `lat`/`lon`.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("terrain_correction", self.terrain_correction.as_str().to_string()),
            (
                "wind_speed_averaging_period",
                self.averaging_period.as_str().to_string(),
            ),
            ("scenario", self.scenario.clone()),
            ("time_horizon", self.time_horizon.clone()),
            ("wind_speed_units", self.wind_speed_units.as_str().to_string()),
        ];
        if let Some(rp) = self.return_period {
            params.push(("return_period", rp.to_string()));
        }
        params
    }
}
