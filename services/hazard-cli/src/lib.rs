//! Library side of the `hazard-csv` binary.
//!
//! Kept separate from `main.rs` so the whole run can be driven against any
//! [`HazardApi`] implementation in tests.

pub mod args;
pub mod input;
pub mod output;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use hazard_client::{ClientConfig, Credentials, HazardApi, HttpHazardClient};
use hazard_common::{HazardError, HazardQuery, QueryPoint};
use hazard_engine::{EngineConfig, HazardPipeline, RegridSpec};
use tracing::info;

pub use args::Args;

/// Load the query points selected by the arguments.
pub fn load_points(args: &Args) -> Result<Vec<QueryPoint>> {
    match &args.input {
        Some(path) if path.as_os_str() == "-" => Ok(input::read_locations(io::stdin().lock())?),
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input {}", path.display()))?;
            input::read_locations(file)
                .with_context(|| format!("Failed to read locations from {}", path.display()))
        }
        None if args.latitudes.is_empty() => Err(HazardError::InvalidInput(
            "either --input or --latitudes/--longitudes is required".to_string(),
        )
        .into()),
        None => Ok(input::points_from_lists(&args.latitudes, &args.longitudes)?),
    }
}

/// Everything a lookup needs, validated before any remote call.
#[derive(Debug, Clone)]
pub struct Job {
    pub query: HazardQuery,
    pub spec: RegridSpec,
    pub points: Vec<QueryPoint>,
    pub engine_config: EngineConfig,
    pub include_header: bool,
}

impl Job {
    pub fn from_args(args: &Args) -> Result<Self> {
        let query = args.resolve_query()?;
        let spec = args.regrid_spec(&query)?;
        let points = load_points(args)?;
        let engine_config = args.engine_config()?;
        Ok(Self {
            query,
            spec,
            points,
            engine_config,
            include_header: !args.no_header,
        })
    }

    /// Run the lookup against `api`, writing the table to `out`.
    pub async fn run<W: Write>(self, api: Arc<dyn HazardApi>, out: W) -> Result<usize> {
        info!(
            points = self.points.len(),
            product = %self.query.product,
            return_period = ?self.query.return_period,
            side_len = self.spec.side_len(),
            workers = self.engine_config.workers,
            "Starting hazard lookup"
        );

        let pipeline = HazardPipeline::new(api, self.query, self.engine_config)?;
        let rows = pipeline.run(&self.points, &self.spec).await?;

        let written = output::write_rows(out, &rows, &self.spec, pipeline.query(), self.include_header)?;
        info!(rows = written, "Wrote output table");
        Ok(written)
    }
}

/// Run the lookup described by `args` against the remote service.
pub async fn run(args: &Args) -> Result<usize> {
    let job = Job::from_args(args)?;

    let mut config = ClientConfig::from_env();
    if let Some(section) = &args.config_section {
        config.credentials_section = section.clone();
    }
    config
        .validate()
        .map_err(|e| HazardError::invalid_parameter("client", e))?;

    let credentials = Credentials::load(&config.credentials_section).map_err(HazardError::from)?;
    let client = HttpHazardClient::new(config, credentials).map_err(HazardError::from)?;
    let api: Arc<dyn HazardApi> = Arc::new(client);

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output {}", path.display()))?;
            job.run(api, BufWriter::new(file)).await
        }
        None => job.run(api, io::stdout().lock()).await,
    }
}

/// Process exit code for a failed run.
///
/// Errors from the pipeline map to their category's code; anything else
/// (file I/O, output) exits with 1.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<HazardError>())
        .map(|e| e.exit_code() as u8)
        .unwrap_or(1)
}
