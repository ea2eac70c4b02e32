//! In-process stand-in for the remote hazard service.
//!
//! Answers every point with a feature for the grid cell containing it, with a
//! wind speed derived from the cell id, so expected values can be computed in
//! tests without a network.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use hazard_client::{AccessToken, HazardApi};
use hazard_common::grid::{cell_bounds, cell_id_of};
use hazard_common::{
    FeatureStatus, HazardError, HazardFeature, HazardResponse, HazardResult, QueryEcho, QueryPoint,
    ResponseHeader, ServiceRequest,
};

type LatencyFn = Box<dyn Fn(&[QueryPoint]) -> Duration + Send + Sync>;
type SimulationYearsFn = Box<dyn Fn(usize) -> u64 + Send + Sync>;

/// Mock [`HazardApi`] with call counters and injectable faults.
pub struct MockHazardService {
    auth_calls: AtomicUsize,
    query_calls: AtomicUsize,
    tokens_seen: Mutex<Vec<String>>,
    fail_on_call: Option<usize>,
    terrain_echo: Option<String>,
    simulation_years: u64,
    simulation_years_fn: Option<SimulationYearsFn>,
    substitutions: HashMap<u64, u32>,
    missing_cells: HashSet<u64>,
    events_per_cell: usize,
    latency: Option<LatencyFn>,
}

impl Default for MockHazardService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHazardService {
    pub fn new() -> Self {
        Self {
            auth_calls: AtomicUsize::new(0),
            query_calls: AtomicUsize::new(0),
            tokens_seen: Mutex::new(Vec::new()),
            fail_on_call: None,
            terrain_echo: None,
            simulation_years: 41_000,
            simulation_years_fn: None,
            substitutions: HashMap::new(),
            missing_cells: HashSet::new(),
            events_per_cell: 1,
            latency: None,
        }
    }

    /// Deterministic wind speed served for a cell.
    pub fn value_for_cell(cell_id: u64) -> f64 {
        100.0 + (cell_id % 97) as f64
    }

    /// Fail the n-th query call (1-based) with a remote error.
    pub fn fail_on_call(mut self, n: usize) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    /// Echo this terrain correction regardless of the request.
    pub fn with_terrain_echo(mut self, terrain: impl Into<String>) -> Self {
        self.terrain_echo = Some(terrain.into());
        self
    }

    pub fn with_simulation_years(mut self, years: u64) -> Self {
        self.simulation_years = years;
        self
    }

    /// Report `simulation_years` computed from the 1-based query call number.
    pub fn with_simulation_years_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) -> u64 + Send + Sync + 'static,
    {
        self.simulation_years_fn = Some(Box::new(f));
        self
    }

    /// Answer fixed return-period queries for `cell_id` with another return period.
    pub fn substitute_return_period_for(mut self, cell_id: u64, return_period: u32) -> Self {
        self.substitutions.insert(cell_id, return_period);
        self
    }

    /// Return no feature at all for `cell_id`.
    pub fn without_cell(mut self, cell_id: u64) -> Self {
        self.missing_cells.insert(cell_id);
        self
    }

    /// Events returned per cell for full-history queries.
    pub fn with_events_per_cell(mut self, n: usize) -> Self {
        self.events_per_cell = n.max(1);
        self
    }

    /// Delay every query call by a duration computed from its points.
    pub fn with_latency_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&[QueryPoint]) -> Duration + Send + Sync + 'static,
    {
        self.latency = Some(Box::new(f));
        self
    }

    pub fn auth_count(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }

    pub fn query_count(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    /// Token used by each query call, in call order.
    pub fn tokens_seen(&self) -> Vec<String> {
        self.tokens_seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn header_for(&self, request: &ServiceRequest, call: usize) -> ResponseHeader {
        let simulation_years = match &self.simulation_years_fn {
            Some(f) => f(call),
            None => self.simulation_years,
        };
        ResponseHeader {
            product: Some(format!("{} Maps v2.0.6", request.product.as_str())),
            terrain_correction: Some(
                self.terrain_echo
                    .clone()
                    .unwrap_or_else(|| request.terrain_correction.as_str().to_string()),
            ),
            wind_speed_averaging_period: Some(request.averaging_period.as_str().to_string()),
            scenario: Some(request.scenario.clone()),
            time_horizon: Some(request.time_horizon.clone()),
            simulation_years: Some(simulation_years),
            wind_speed_units: Some(request.wind_speed_units.as_str().to_string()),
        }
    }

    fn features_for(&self, cell_id: u64, request: &ServiceRequest) -> Vec<HazardFeature> {
        if self.missing_cells.contains(&cell_id) {
            return Vec::new();
        }

        let echo = QueryEcho::from_request(request);
        let value = Self::value_for_cell(cell_id);
        let base = HazardFeature {
            cell_id,
            bounds: cell_bounds(cell_id),
            wind_speed: Some(value),
            status: FeatureStatus::Ok,
            return_period: None,
            event_id: None,
            storm_name: None,
            storm_year: None,
            echo,
        };

        match request.return_period {
            Some(rp) => vec![HazardFeature {
                return_period: Some(self.substitutions.get(&cell_id).copied().unwrap_or(rp)),
                ..base
            }],
            None => (0..self.events_per_cell)
                .map(|k| HazardFeature {
                    wind_speed: Some(value - 5.0 * k as f64),
                    event_id: Some(format!("{}-{}", cell_id, k)),
                    storm_name: Some(format!("STORM{}", k)),
                    storm_year: Some(1980 + k as i32),
                    ..base.clone()
                })
                .collect(),
        }
    }
}

#[async_trait]
impl HazardApi for MockHazardService {
    async fn authenticate(&self) -> HazardResult<AccessToken> {
        let n = self.auth_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(AccessToken::new(format!("mock-token-{}", n)))
    }

    async fn query_points(
        &self,
        token: &AccessToken,
        points: &[QueryPoint],
        request: &ServiceRequest,
    ) -> HazardResult<HazardResponse> {
        let n = self.query_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.tokens_seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(token.secret().to_string());

        if let Some(latency) = &self.latency {
            tokio::time::sleep(latency(points)).await;
        }

        if self.fail_on_call == Some(n) {
            return Err(HazardError::Remote(format!(
                "API returned HTTP 500 with mock failure on call {}",
                n
            )));
        }

        let features = points
            .iter()
            .flat_map(|p| self.features_for(cell_id_of(p.lat, p.lon), request))
            .collect();

        Ok(HazardResponse {
            header: self.header_for(request, n),
            features,
        })
    }
}
