//! Command-line arguments and their resolution into engine inputs.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use hazard_common::{
    AveragingPeriod, HazardError, HazardQuery, HazardResult, Product, TerrainCorrection,
    WindSpeedUnits,
};
use hazard_engine::{EngineConfig, Reducer, RegridSpec};

/// Look up tropical cyclone wind hazard for a table of locations.
#[derive(Parser, Debug, Clone)]
#[command(name = "hazard-csv")]
#[command(about = "Query gridded wind hazard at a list of locations and write a CSV table")]
pub struct Args {
    /// CSV file with latitude/longitude columns ("-" reads stdin)
    #[arg(short, long, conflicts_with_all = ["latitudes", "longitudes"])]
    pub input: Option<PathBuf>,

    /// Comma-separated latitudes, paired with --longitudes
    #[arg(
        long,
        value_delimiter = ',',
        num_args = 1,
        allow_hyphen_values = true,
        requires = "longitudes"
    )]
    pub latitudes: Vec<f64>,

    /// Comma-separated longitudes, paired with --latitudes
    #[arg(
        long,
        value_delimiter = ',',
        num_args = 1,
        allow_hyphen_values = true,
        requires = "latitudes"
    )]
    pub longitudes: Vec<f64>,

    /// Output CSV path (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Do not write a header row
    #[arg(long)]
    pub no_header: bool,

    /// YAML file holding the hazard query
    #[arg(long)]
    pub query_config: Option<PathBuf>,

    /// Hazard product (DeepCyc or Metryc)
    #[arg(long)]
    pub product: Option<Product>,

    /// Terrain correction
    #[arg(long)]
    pub terrain_correction: Option<TerrainCorrection>,

    /// Wind speed averaging period (3_seconds, 1_minute, 10_minutes)
    #[arg(long, alias = "averaging-period")]
    pub wind_speed_averaging_period: Option<AveragingPeriod>,

    /// Climate scenario
    #[arg(long)]
    pub scenario: Option<String>,

    /// Climate time horizon
    #[arg(long)]
    pub time_horizon: Option<String>,

    /// Fixed return period in years (full event history when omitted)
    #[arg(long)]
    pub return_period: Option<u32>,

    /// Wind speed units
    #[arg(long)]
    pub wind_speed_units: Option<WindSpeedUnits>,

    /// Value of the product-version request header
    #[arg(long)]
    pub product_version: Option<String>,

    /// Also return the neighbor cells within this many cells of each point
    #[arg(long, conflicts_with = "regrid_resolution")]
    pub halo_size: Option<u32>,

    /// Regrid to a square of this many cells per side (odd)
    #[arg(long)]
    pub regrid_resolution: Option<u32>,

    /// Reducer for --regrid-resolution (mean, median, max)
    #[arg(long, default_value = "mean")]
    pub reducer: Reducer,

    /// Concurrent workers
    #[arg(long, env = "HAZARD_WORKERS")]
    pub workers: Option<usize>,

    /// Section of ~/.reask holding the credentials
    #[arg(long, env = "REASK_CONFIG_SECTION")]
    pub config_section: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// The hazard query: the YAML file if given, overridden by individual flags.
    pub fn resolve_query(&self) -> Result<HazardQuery> {
        let mut query = match &self.query_config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read query config {}", path.display()))?;
                serde_yaml::from_str(&text)
                    .map_err(|e| HazardError::InvalidInput(format!("{}: {}", path.display(), e)))?
            }
            None => HazardQuery::default(),
        };

        if let Some(product) = self.product {
            query.product = product;
        }
        if let Some(terrain) = self.terrain_correction {
            query.terrain_correction = terrain;
        }
        if let Some(period) = self.wind_speed_averaging_period {
            query.averaging_period = period;
        }
        if let Some(scenario) = &self.scenario {
            query.scenario = scenario.clone();
        }
        if let Some(horizon) = &self.time_horizon {
            query.time_horizon = horizon.clone();
        }
        if self.return_period.is_some() {
            query.return_period = self.return_period;
        }
        if let Some(units) = self.wind_speed_units {
            query.wind_speed_units = units;
        }
        if self.product_version.is_some() {
            query.product_version = self.product_version.clone();
        }

        query.validate()?;
        Ok(query)
    }

    /// The neighborhood request, validated against the query kind.
    pub fn regrid_spec(&self, query: &HazardQuery) -> HazardResult<RegridSpec> {
        let spec = RegridSpec::from_options(self.halo_size, self.regrid_resolution, self.reducer)?;
        spec.validate_for(query.kind())?;
        Ok(spec)
    }

    /// Engine settings from the environment with flag overrides.
    pub fn engine_config(&self) -> HazardResult<EngineConfig> {
        let mut config = EngineConfig::from_env();
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        config
            .validate()
            .map_err(|e| HazardError::invalid_parameter("workers", e))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hazard_common::ErrorCategory;

    fn parse(args: &[&str]) -> Args {
        let mut argv = vec!["hazard-csv"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_coordinate_lists() {
        let args = parse(&["--latitudes", "25.1,-17.5", "--longitudes", "-80.2,179.9"]);
        assert_eq!(args.latitudes, vec![25.1, -17.5]);
        assert_eq!(args.longitudes, vec![-80.2, 179.9]);
        assert!(args.input.is_none());
    }

    #[test]
    fn test_input_conflicts_with_lists() {
        let result = Args::try_parse_from([
            "hazard-csv",
            "--input",
            "points.csv",
            "--latitudes",
            "25.0",
            "--longitudes",
            "-80.0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_halo_and_resolution_conflict() {
        let result = Args::try_parse_from([
            "hazard-csv",
            "--input",
            "points.csv",
            "--halo-size",
            "1",
            "--regrid-resolution",
            "3",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flag_overrides() {
        let args = parse(&[
            "--input",
            "points.csv",
            "--terrain-correction",
            "open_water",
            "--averaging-period",
            "10_minutes",
            "--return-period",
            "250",
            "--wind-speed-units",
            "mph",
        ]);

        let query = args.resolve_query().unwrap();
        assert_eq!(query.terrain_correction, TerrainCorrection::OpenWater);
        assert_eq!(query.averaging_period, AveragingPeriod::TenMinutes);
        assert_eq!(query.return_period, Some(250));
        assert_eq!(query.wind_speed_units, WindSpeedUnits::Mph);
        assert_eq!(query.scenario, "current_climate");
    }

    #[test]
    fn test_invalid_query_is_input_error() {
        let args = parse(&["--input", "points.csv", "--averaging-period", "10_minutes"]);
        let err = args.resolve_query().unwrap_err();
        let hazard = err.downcast_ref::<HazardError>().unwrap();
        assert_eq!(hazard.category(), ErrorCategory::Input);
    }

    #[test]
    fn test_regrid_spec() {
        let args = parse(&[
            "--input",
            "points.csv",
            "--regrid-resolution",
            "5",
            "--reducer",
            "max",
        ]);
        let query = HazardQuery {
            return_period: Some(100),
            ..Default::default()
        };
        assert_eq!(
            args.regrid_spec(&query).unwrap(),
            RegridSpec::Resolution {
                side_len: 5,
                reducer: Reducer::Max
            }
        );

        // neighborhoods need a fixed return period
        assert!(args.regrid_spec(&HazardQuery::default()).is_err());
    }

    #[test]
    fn test_even_resolution_rejected() {
        let args = parse(&["--input", "points.csv", "--regrid-resolution", "4"]);
        let query = HazardQuery {
            return_period: Some(100),
            ..Default::default()
        };
        let err = args.regrid_spec(&query).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Input);
    }

    #[test]
    fn test_huge_halo_rejected() {
        let query = HazardQuery {
            return_period: Some(100),
            ..Default::default()
        };
        for halo in ["2147483648", "4294967295", "51"] {
            let args = parse(&["--input", "points.csv", "--halo-size", halo]);
            let err = args.regrid_spec(&query).unwrap_err();
            assert_eq!(err.category(), ErrorCategory::Input);
        }

        let args = parse(&["--input", "points.csv", "--halo-size", "50"]);
        assert_eq!(args.regrid_spec(&query).unwrap().side_len(), 101);
    }
}
