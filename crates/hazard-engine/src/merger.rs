//! Merging per-batch results into one table.

use std::collections::HashSet;

use hazard_common::{AveragingPeriod, FeatureStatus, HazardFeature, TerrainCorrection};

use crate::dispatcher::BatchResult;

/// Identity of a feature row over every field. Floats compare bitwise.
#[derive(PartialEq, Eq, Hash)]
struct RowKey<'a> {
    cell_id: u64,
    bounds: [u64; 4],
    wind_speed: Option<u64>,
    status: FeatureStatus,
    return_period: Option<u32>,
    event_id: Option<&'a str>,
    storm_name: Option<&'a str>,
    storm_year: Option<i32>,
    terrain_correction: TerrainCorrection,
    averaging_period: AveragingPeriod,
    scenario: &'a str,
    time_horizon: &'a str,
}

impl<'a> RowKey<'a> {
    fn of(f: &'a HazardFeature) -> Self {
        Self {
            cell_id: f.cell_id,
            bounds: [
                f.bounds.min_lon.to_bits(),
                f.bounds.min_lat.to_bits(),
                f.bounds.max_lon.to_bits(),
                f.bounds.max_lat.to_bits(),
            ],
            wind_speed: f.wind_speed.map(f64::to_bits),
            status: f.status,
            return_period: f.return_period,
            event_id: f.event_id.as_deref(),
            storm_name: f.storm_name.as_deref(),
            storm_year: f.storm_year,
            terrain_correction: f.echo.terrain_correction,
            averaging_period: f.echo.averaging_period,
            scenario: &f.echo.scenario,
            time_horizon: &f.echo.time_horizon,
        }
    }
}

/// Drop exact duplicate rows, keeping the first occurrence of each.
pub fn dedup_rows(features: &[HazardFeature]) -> Vec<HazardFeature> {
    let mut seen = HashSet::with_capacity(features.len());
    features
        .iter()
        .filter(|f| seen.insert(RowKey::of(*f)))
        .cloned()
        .collect()
}

/// Concatenate batch results in batch order and drop exact duplicates.
pub fn merge_batches(results: &[BatchResult]) -> Vec<HazardFeature> {
    let all: Vec<HazardFeature> = results
        .iter()
        .flat_map(|r| r.features.iter().cloned())
        .collect();
    dedup_rows(&all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hazard_common::{grid, HazardQuery, QueryEcho, ResponseHeader};

    fn feature(cell_id: u64, wind_speed: f64) -> HazardFeature {
        let request = HazardQuery::default().service_request();
        HazardFeature {
            cell_id,
            bounds: grid::cell_bounds(cell_id),
            wind_speed: Some(wind_speed),
            status: FeatureStatus::Ok,
            return_period: Some(100),
            event_id: None,
            storm_name: None,
            storm_year: None,
            echo: QueryEcho::from_request(&request),
        }
    }

    fn result(index: usize, features: Vec<HazardFeature>) -> BatchResult {
        BatchResult {
            index,
            point_indices: vec![index],
            header: ResponseHeader::default(),
            features,
        }
    }

    #[test]
    fn test_overlapping_batches_deduplicated() {
        let results = vec![
            result(0, vec![feature(1, 100.0), feature(2, 110.0)]),
            result(1, vec![feature(2, 110.0), feature(3, 120.0)]),
        ];

        let merged = merge_batches(&results);
        let ids: Vec<u64> = merged.iter().map(|f| f.cell_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_same_cell_different_tags_kept() {
        let mut future = feature(2, 110.0);
        future.echo.scenario = "SSP5-8.5".to_string();
        future.echo.time_horizon = "2050".to_string();

        let merged = merge_batches(&[result(0, vec![feature(2, 110.0)]), result(1, vec![future])]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_same_cell_different_values_kept() {
        let merged = dedup_rows(&[feature(5, 100.0), feature(5, 100.5)]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_dedup_idempotent() {
        let rows = vec![
            feature(1, 100.0),
            feature(1, 100.0),
            feature(2, 90.0),
            feature(1, 100.0),
        ];
        let once = dedup_rows(&rows);
        let twice = dedup_rows(&once);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 2);
    }

    #[test]
    fn test_no_content_rows_compare_equal() {
        let request = HazardQuery::default().service_request();
        let echo = QueryEcho::from_request(&request);
        let rows = vec![
            HazardFeature::no_content(9, echo.clone(), None),
            HazardFeature::no_content(9, echo, None),
        ];
        assert_eq!(dedup_rows(&rows).len(), 1);
    }
}
