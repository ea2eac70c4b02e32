//! End-to-end aggregation of hazard values at query points.

use std::sync::Arc;

use hazard_client::HazardApi;
use hazard_common::{validate_points, HazardError, HazardQuery, HazardResult, QueryPoint, ServiceRequest};
use tracing::{info, instrument};

use crate::batcher::plan_batches;
use crate::config::EngineConfig;
use crate::dispatcher::{consistent_simulation_years, FetchDispatcher};
use crate::joiner::{join, verify_identity, JoinedRow};
use crate::merger::merge_batches;
use crate::regrid::{self, offset_layers, AggregatedRow, LayerRows, RegridSpec};
use crate::sanitizer::sanitize;
use crate::units::convert_to_ten_minutes;

/// Batches, fetches, joins and regrids hazard values for a query.
pub struct HazardPipeline {
    dispatcher: FetchDispatcher,
    query: HazardQuery,
    request: ServiceRequest,
}

impl HazardPipeline {
    /// Create a pipeline, validating the query and configuration up front.
    pub fn new(api: Arc<dyn HazardApi>, query: HazardQuery, config: EngineConfig) -> HazardResult<Self> {
        query.validate()?;
        config
            .validate()
            .map_err(|e| HazardError::invalid_parameter("engine", e))?;

        let request = query.service_request();
        Ok(Self {
            dispatcher: FetchDispatcher::new(api, config),
            query,
            request,
        })
    }

    pub fn query(&self) -> &HazardQuery {
        &self.query
    }

    /// What is sent to the remote service for this query.
    pub fn service_request(&self) -> &ServiceRequest {
        &self.request
    }

    /// Run the whole pipeline over `points`.
    ///
    /// Rows come back ordered by input point, then neighborhood offset, then
    /// feature order within a cell.
    #[instrument(skip(self, points), fields(points = points.len(), side_len = spec.side_len()))]
    pub async fn run(&self, points: &[QueryPoint], spec: &RegridSpec) -> HazardResult<Vec<AggregatedRow>> {
        validate_points(points)?;
        spec.validate_for(self.query.kind())?;

        if points.is_empty() {
            return Ok(Vec::new());
        }

        let side_len = spec.side_len();
        let mut simulation_years = None;

        let mut rows = if side_len == 1 {
            let joined = self.fetch_layer(points, points, &mut simulation_years).await?;
            regrid::single_cell(joined, spec)
        } else {
            let layers = offset_layers(points, side_len)?;
            let total = layers.len();
            let mut layer_rows = Vec::with_capacity(total);

            for (i, layer) in layers.into_iter().enumerate() {
                let rows = self.fetch_layer(points, &layer.points, &mut simulation_years).await?;
                info!(
                    layer = i + 1,
                    layers = total,
                    row_offset = layer.row_offset,
                    col_offset = layer.col_offset,
                    "Layer fetched"
                );
                layer_rows.push(LayerRows {
                    row_offset: layer.row_offset,
                    col_offset: layer.col_offset,
                    rows,
                });
            }

            match *spec {
                RegridSpec::Resolution { reducer, .. } => {
                    regrid::regrid(&layer_rows, points.len(), side_len, reducer)?
                }
                _ => regrid::halo(layer_rows, points.len()),
            }
        };

        if self.query.needs_ten_minute_conversion() {
            convert_to_ten_minutes(&mut rows)?;
        }

        sanitize(&mut rows, self.query.return_period);

        // stable: keeps layer and feature order within a point
        rows.sort_by_key(|r| r.point_index);

        info!(rows = rows.len(), "Pipeline complete");
        Ok(rows)
    }

    /// One fetch, merge and join pass over `queried`, joined back to `originals`.
    async fn fetch_layer(
        &self,
        originals: &[QueryPoint],
        queried: &[QueryPoint],
        simulation_years: &mut Option<u64>,
    ) -> HazardResult<Vec<JoinedRow>> {
        let batches = plan_batches(queried, self.query.kind(), self.dispatcher.config());
        let results = self.dispatcher.fetch_all(batches, &self.request).await?;
        *simulation_years = consistent_simulation_years(&results, *simulation_years)?;

        let features = merge_batches(&results);
        let mut rows = join(originals, queried, &features, &self.request)?;
        verify_identity(originals, &rows)?;

        let substituted = sanitize(&mut rows, self.query.return_period);
        if substituted > 0 {
            info!(rows = substituted, "Flagged substituted return periods as NO CONTENT");
        }

        Ok(rows)
    }
}
