//! Parallel execution of batches against the remote service.
//!
//! A bounded channel of batches feeds a fixed pool of fetch tasks. Each task
//! owns one authenticated session and renews it before a call once the token
//! is older than the configured budget. The first failing batch aborts the
//! whole fetch: remaining tasks are cancelled and drained before the error is
//! returned, so callers never see partial results.

use std::sync::Arc;
use std::time::Duration;

use hazard_client::{AccessToken, HazardApi};
use hazard_common::{HazardError, HazardFeature, HazardResult, ResponseHeader, ServiceRequest};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::batcher::Batch;
use crate::config::EngineConfig;

/// Response to one batch, tagged with where its points came from.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub index: usize,
    pub point_indices: Vec<usize>,
    pub header: ResponseHeader,
    pub features: Vec<HazardFeature>,
}

/// An authenticated session owned by exactly one worker.
#[derive(Debug, Clone)]
pub struct WorkerSession {
    token: AccessToken,
    authenticated_at: Instant,
}

impl WorkerSession {
    /// Authenticate a new session.
    pub async fn open(api: &dyn HazardApi) -> HazardResult<Self> {
        let token = api.authenticate().await?;
        Ok(Self {
            token,
            authenticated_at: Instant::now(),
        })
    }

    pub fn token(&self) -> &AccessToken {
        &self.token
    }

    /// Time since the session was authenticated.
    pub fn age(&self) -> Duration {
        self.authenticated_at.elapsed()
    }

    pub fn is_expired(&self, budget: Duration) -> bool {
        self.age() > budget
    }

    /// Re-authenticate if the session has outlived its budget.
    pub async fn renew_if_expired(&mut self, api: &dyn HazardApi, budget: Duration) -> HazardResult<bool> {
        if !self.is_expired(budget) {
            return Ok(false);
        }

        let age = self.age();
        let previous_issued_at = self.token.issued_at();
        *self = Self::open(api).await?;

        metrics::counter!("hazard_reauthentications_total").increment(1);
        info!(
            previous_age_secs = age.as_secs(),
            previous_issued_at = %previous_issued_at.to_rfc3339(),
            "Re-authenticated worker session"
        );
        Ok(true)
    }
}

/// Runs batches through a [`HazardApi`] with a fixed pool of workers.
pub struct FetchDispatcher {
    api: Arc<dyn HazardApi>,
    config: EngineConfig,
    /// Sessions handed back by workers, reused by the next fetch.
    idle_sessions: Mutex<Vec<WorkerSession>>,
}

struct WorkerOutcome {
    results: Vec<BatchResult>,
    session: Option<WorkerSession>,
}

impl FetchDispatcher {
    pub fn new(api: Arc<dyn HazardApi>, config: EngineConfig) -> Self {
        Self {
            api,
            config,
            idle_sessions: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fetch every batch and return the results ordered by batch index.
    #[instrument(skip(self, batches, request), fields(batches = batches.len()))]
    pub async fn fetch_all(
        &self,
        batches: Vec<Batch>,
        request: &ServiceRequest,
    ) -> HazardResult<Vec<BatchResult>> {
        let total = batches.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let workers = self.config.workers.max(1).min(total);
        let (tx, rx) = mpsc::channel::<Batch>(workers * 2);
        let rx = Arc::new(Mutex::new(rx));
        let request = Arc::new(request.clone());

        let mut tasks = JoinSet::new();
        {
            let mut idle = self.idle_sessions.lock().await;
            for worker_id in 0..workers {
                let worker = Worker {
                    id: worker_id,
                    api: Arc::clone(&self.api),
                    rx: Arc::clone(&rx),
                    request: Arc::clone(&request),
                    budget: self.config.session_budget,
                };
                tasks.spawn(worker.run(idle.pop()));
            }
        }

        let feeder = tokio::spawn(async move {
            for batch in batches {
                if tx.send(batch).await.is_err() {
                    break;
                }
            }
        });

        let mut results = Vec::with_capacity(total);
        let mut returned_sessions = Vec::with_capacity(workers);
        let mut failure: Option<HazardError> = None;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(outcome)) => {
                    results.extend(outcome.results);
                    returned_sessions.extend(outcome.session);
                }
                Ok(Err(e)) => {
                    if failure.is_none() {
                        error!(error = %e, "Batch failed, aborting fetch");
                        tasks.abort_all();
                        feeder.abort();
                        failure = Some(e);
                    }
                }
                Err(join_err) if join_err.is_cancelled() => {}
                Err(join_err) => {
                    if failure.is_none() {
                        error!(error = %join_err, "Fetch worker panicked, aborting fetch");
                        tasks.abort_all();
                        feeder.abort();
                        failure = Some(HazardError::Internal(format!(
                            "fetch worker panicked: {}",
                            join_err
                        )));
                    }
                }
            }
        }

        self.idle_sessions.lock().await.extend(returned_sessions);

        if let Some(e) = failure {
            return Err(e);
        }

        if results.len() != total {
            return Err(HazardError::Internal(format!(
                "expected {} batch results, collected {}",
                total,
                results.len()
            )));
        }

        results.sort_by_key(|r| r.index);
        consistent_simulation_years(&results, None)?;

        debug!(batches = total, workers = workers, "Fetch complete");
        Ok(results)
    }
}

/// Check that every batch reports the same `simulation_years`.
///
/// `expected` carries the value seen by earlier fetches of the same run.
/// Returns the value agreed on, if any batch reported one.
pub fn consistent_simulation_years(
    results: &[BatchResult],
    expected: Option<u64>,
) -> HazardResult<Option<u64>> {
    let mut agreed = expected;

    for result in results {
        match (agreed, result.header.simulation_years) {
            (_, None) => {}
            (None, Some(years)) => agreed = Some(years),
            (Some(a), Some(b)) if a == b => {}
            (Some(a), Some(b)) => {
                return Err(HazardError::header_mismatch(
                    "simulation_years",
                    a.to_string(),
                    b.to_string(),
                ));
            }
        }
    }

    Ok(agreed)
}

struct Worker {
    id: usize,
    api: Arc<dyn HazardApi>,
    rx: Arc<Mutex<mpsc::Receiver<Batch>>>,
    request: Arc<ServiceRequest>,
    budget: Duration,
}

impl Worker {
    async fn run(self, mut session: Option<WorkerSession>) -> HazardResult<WorkerOutcome> {
        let mut results = Vec::new();

        loop {
            let batch = {
                let mut rx = self.rx.lock().await;
                rx.recv().await
            };
            let Some(batch) = batch else { break };

            let token = match session.as_mut() {
                Some(s) => {
                    s.renew_if_expired(self.api.as_ref(), self.budget).await?;
                    s.token().clone()
                }
                None => {
                    let s = WorkerSession::open(self.api.as_ref()).await?;
                    info!(worker = self.id, "Authenticated worker session");
                    let token = s.token().clone();
                    session = Some(s);
                    token
                }
            };

            results.push(self.fetch_batch(&token, batch).await?);
        }

        Ok(WorkerOutcome { results, session })
    }

    async fn fetch_batch(&self, token: &AccessToken, batch: Batch) -> HazardResult<BatchResult> {
        debug!(worker = self.id, batch = batch.index, points = batch.len(), "Dispatching batch");
        let start = std::time::Instant::now();

        let response = match self.api.query_points(token, &batch.points, &self.request).await {
            Ok(response) => response,
            Err(e) => {
                metrics::counter!("hazard_batch_failures_total").increment(1);
                warn!(worker = self.id, batch = batch.index, error = %e, "Remote query failed");
                return Err(e);
            }
        };

        if let Err(e) = response.header.verify_against(&self.request) {
            metrics::counter!("hazard_batch_failures_total").increment(1);
            return Err(e);
        }

        metrics::counter!("hazard_batches_total").increment(1);
        metrics::histogram!("hazard_batch_duration_seconds").record(start.elapsed().as_secs_f64());

        debug!(
            worker = self.id,
            batch = batch.index,
            features = response.features.len(),
            "Batch complete"
        );

        Ok(BatchResult {
            index: batch.index,
            point_indices: batch.point_indices,
            header: response.header,
            features: response.features,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batcher::plan_batches;
    use hazard_common::{HazardQuery, QueryKind, QueryPoint};
    use test_utils::MockHazardService;

    fn request() -> ServiceRequest {
        HazardQuery {
            return_period: Some(100),
            ..Default::default()
        }
        .service_request()
    }

    fn points(n: usize) -> Vec<QueryPoint> {
        (0..n)
            .map(|i| QueryPoint::new(25.0 + i as f64 * 0.05, -80.0))
            .collect()
    }

    fn dispatcher(mock: &Arc<MockHazardService>, config: EngineConfig) -> FetchDispatcher {
        let api: Arc<dyn HazardApi> = mock.clone();
        FetchDispatcher::new(api, config)
    }

    #[tokio::test]
    async fn test_results_ordered_by_batch_index() {
        // later batches answer first
        let mock = Arc::new(MockHazardService::new().with_latency_fn(|call_points| {
            Duration::from_millis(200 - (call_points[0].lat * 10.0) as u64 % 200)
        }));
        let config = EngineConfig {
            workers: 4,
            fixed_value_batch_size: 1,
            ..Default::default()
        };
        let batches = plan_batches(&points(12), QueryKind::FixedValue, &config);

        let results = dispatcher(&mock, config).fetch_all(batches, &request()).await.unwrap();

        assert_eq!(results.len(), 12);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.index, i);
            assert_eq!(result.point_indices, vec![i]);
        }
    }

    #[tokio::test]
    async fn test_failing_batch_aborts_fetch() {
        let mock = Arc::new(MockHazardService::new().fail_on_call(3));
        let config = EngineConfig {
            workers: 2,
            fixed_value_batch_size: 1,
            ..Default::default()
        };
        let batches = plan_batches(&points(10), QueryKind::FixedValue, &config);

        let err = dispatcher(&mock, config).fetch_all(batches, &request()).await.unwrap_err();
        assert!(matches!(err, HazardError::Remote(_)));
    }

    #[tokio::test]
    async fn test_header_mismatch_aborts_fetch() {
        let mock = Arc::new(MockHazardService::new().with_terrain_echo("open_terrain"));
        let config = EngineConfig::default();
        let batches = plan_batches(&points(3), QueryKind::FixedValue, &config);

        let err = dispatcher(&mock, config).fetch_all(batches, &request()).await.unwrap_err();
        assert!(matches!(err, HazardError::HeaderMismatch { ref field, .. } if field == "terrain_correction"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_renewed_after_budget() {
        let mock = Arc::new(
            MockHazardService::new().with_latency_fn(|_| Duration::from_secs(40 * 60)),
        );
        let config = EngineConfig {
            workers: 1,
            fixed_value_batch_size: 1,
            ..Default::default()
        };
        let batches = plan_batches(&points(3), QueryKind::FixedValue, &config);

        dispatcher(&mock, config).fetch_all(batches, &request()).await.unwrap();

        // calls at t=0 and t=40m share a token, the call at t=80m renews it
        assert_eq!(mock.auth_count(), 2);
        let tokens = mock.tokens_seen();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0], tokens[1]);
        assert_ne!(tokens[1], tokens[2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sessions_reused_across_fetches() {
        let mock = Arc::new(MockHazardService::new());
        let config = EngineConfig {
            workers: 2,
            fixed_value_batch_size: 1,
            ..Default::default()
        };
        let dispatcher = dispatcher(&mock, config.clone());

        for _ in 0..3 {
            let batches = plan_batches(&points(4), QueryKind::FixedValue, &config);
            dispatcher.fetch_all(batches, &request()).await.unwrap();
        }

        assert!(mock.auth_count() <= 2);
        assert_eq!(mock.query_count(), 12);
    }

    #[test]
    fn test_simulation_years_consistency() {
        let result = |index, years| BatchResult {
            index,
            point_indices: vec![index],
            header: ResponseHeader {
                simulation_years: years,
                ..Default::default()
            },
            features: Vec::new(),
        };

        let agreed = vec![result(0, Some(41_000)), result(1, None), result(2, Some(41_000))];
        assert_eq!(consistent_simulation_years(&agreed, None).unwrap(), Some(41_000));
        assert!(consistent_simulation_years(&agreed, Some(10_000)).is_err());

        let mixed = vec![result(0, Some(41_000)), result(1, Some(10_000))];
        assert!(matches!(
            consistent_simulation_years(&mixed, None),
            Err(HazardError::HeaderMismatch { .. })
        ));
    }
}
