//! Neighborhood expansion and regridding.
//!
//! A neighborhood of `side_len x side_len` cells around each query point is
//! built from "layers": one fetch+join pass per cell offset, each holding one
//! neighbor per original point. Halo mode emits every layer; resolution mode
//! reduces the layers into one value per point.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use hazard_common::grid::{self, cell_id_from_row_col, row_col_of, NUM_COLUMNS, RESOLUTION_DEG};
use hazard_common::{FeatureStatus, HazardError, HazardFeature, HazardResult, QueryKind, QueryPoint};
use serde::{Deserialize, Serialize};

use crate::joiner::{FeatureRow, JoinedRow};

/// Largest accepted neighborhood side; each cell of the square is one full
/// fetch pass over every point.
pub const MAX_SIDE_LEN: u32 = 101;

/// Reduction applied across a neighborhood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Reducer {
    #[default]
    Mean,
    Median,
    Max,
}

impl Reducer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Max => "max",
        }
    }

    /// Reduce values; `None` for an empty input.
    pub fn reduce(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }

        match self {
            Self::Mean => Some(values.iter().sum::<f64>() / values.len() as f64),
            Self::Max => values.iter().copied().reduce(f64::max),
            Self::Median => {
                let mut sorted = values.to_vec();
                sorted.sort_by(|a, b| a.total_cmp(b));
                let mid = sorted.len() / 2;
                if sorted.len() % 2 == 1 {
                    Some(sorted[mid])
                } else {
                    Some((sorted[mid - 1] + sorted[mid]) / 2.0)
                }
            }
        }
    }
}

impl fmt::Display for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Reducer {
    type Err = HazardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "max" => Ok(Self::Max),
            other => Err(HazardError::invalid_parameter(
                "reducer",
                format!("unknown reducer '{}', expected mean, median or max", other),
            )),
        }
    }
}

/// How results are regridded around each query point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegridSpec {
    /// One row per point at native resolution.
    #[default]
    None,
    /// Every cell of a `(2 * halo_size + 1)` square around the point.
    Halo { halo_size: u32 },
    /// One aggregate value over a `side_len` square around the point.
    Resolution { side_len: u32, reducer: Reducer },
}

impl RegridSpec {
    /// Build from the mutually exclusive `halo_size` / `regrid_resolution` options.
    pub fn from_options(
        halo_size: Option<u32>,
        regrid_resolution: Option<u32>,
        reducer: Reducer,
    ) -> HazardResult<Self> {
        let spec = match (halo_size, regrid_resolution) {
            (Some(_), Some(_)) => {
                return Err(HazardError::InvalidInput(
                    "halo_size and regrid_resolution are mutually exclusive".to_string(),
                ))
            }
            (Some(halo_size), None) => Self::Halo { halo_size },
            (None, Some(side_len)) => Self::Resolution { side_len, reducer },
            (None, None) => Self::None,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Cells along one side of the neighborhood.
    ///
    /// Saturates for halo sizes past `u32::MAX / 2`; `validate` rejects those.
    pub fn side_len(&self) -> u32 {
        match self {
            Self::None => 1,
            Self::Halo { halo_size } => halo_size.saturating_mul(2).saturating_add(1),
            Self::Resolution { side_len, .. } => *side_len,
        }
    }

    pub fn validate(&self) -> HazardResult<()> {
        match self {
            Self::None => {}
            Self::Halo { halo_size } => {
                let max_halo = MAX_SIDE_LEN / 2;
                if *halo_size > max_halo {
                    return Err(HazardError::invalid_parameter(
                        "halo_size",
                        format!("must be at most {}, got {}", max_halo, halo_size),
                    ));
                }
            }
            Self::Resolution { side_len, .. } => check_side_len("regrid_resolution", *side_len)?,
        }
        Ok(())
    }

    /// Check this neighborhood can be applied to a query of the given kind.
    ///
    /// Neighborhoods need exactly one value per cell, which full-history
    /// queries do not provide.
    pub fn validate_for(&self, kind: QueryKind) -> HazardResult<()> {
        self.validate()?;
        if self.side_len() > 1 && kind == QueryKind::FullHistory {
            return Err(HazardError::InvalidInput(
                "halo and regrid require a fixed return period query".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_side_len(name: &str, side_len: u32) -> HazardResult<()> {
    if side_len == 0 || side_len % 2 == 0 || side_len > MAX_SIDE_LEN {
        return Err(HazardError::invalid_parameter(
            name,
            format!(
                "must be an odd number of cells between 1 and {}, got {}",
                MAX_SIDE_LEN, side_len
            ),
        ));
    }
    Ok(())
}

/// Where an output row came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Provenance {
    /// Native cell of the query point.
    Point,
    /// Neighbor cell, offset in rows (latitude) and columns (longitude).
    Halo { row_offset: i32, col_offset: i32 },
    /// Aggregate over a neighborhood; the feature's cell is the center cell.
    Regrid {
        resolution_deg: f64,
        reducer: Reducer,
        /// Cells that contributed a value.
        cells_used: usize,
    },
}

/// Unit conversion applied to a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    OneMinuteToTenMinutes,
}

impl Conversion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneMinuteToTenMinutes => "1_minute->10_minutes",
        }
    }
}

/// One output record.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRow {
    pub point_index: usize,
    pub location_id: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub feature: HazardFeature,
    pub provenance: Provenance,
    pub conversion: Option<Conversion>,
}

impl AggregatedRow {
    fn from_joined(row: JoinedRow, provenance: Provenance) -> Self {
        Self {
            point_index: row.point_index,
            location_id: row.location_id,
            lat: row.lat,
            lon: row.lon,
            feature: row.feature,
            provenance,
            conversion: None,
        }
    }
}

impl FeatureRow for AggregatedRow {
    fn feature(&self) -> &HazardFeature {
        &self.feature
    }

    fn feature_mut(&mut self) -> &mut HazardFeature {
        &mut self.feature
    }
}

/// Query points of one neighborhood offset.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub row_offset: i32,
    pub col_offset: i32,
    /// One point per original point, inside the offset cell.
    pub points: Vec<QueryPoint>,
}

impl Layer {
    pub fn is_center(&self) -> bool {
        self.row_offset == 0 && self.col_offset == 0
    }
}

/// Joined rows of one layer.
#[derive(Debug, Clone)]
pub struct LayerRows {
    pub row_offset: i32,
    pub col_offset: i32,
    pub rows: Vec<JoinedRow>,
}

/// Build the `side_len²` layers around `points`, rows (latitude) outer.
///
/// Offset points are placed at the center of the neighbor cell so that
/// rounding never moves them across a cell edge. The center layer keeps the
/// caller's points unchanged.
pub fn offset_layers(points: &[QueryPoint], side_len: u32) -> HazardResult<Vec<Layer>> {
    check_side_len("side_len", side_len)?;

    let half = (side_len / 2) as i32;
    let centers: Vec<(i64, i64)> = points
        .iter()
        .map(|p| {
            let (row, col) = row_col_of(grid::cell_id_of(p.lat, p.lon));
            (row as i64, col as i64)
        })
        .collect();

    let mut layers = Vec::with_capacity(side_len as usize * side_len as usize);

    for row_offset in -half..=half {
        for col_offset in -half..=half {
            if row_offset == 0 && col_offset == 0 {
                layers.push(Layer {
                    row_offset,
                    col_offset,
                    points: points.to_vec(),
                });
                continue;
            }

            let mut offset_points = Vec::with_capacity(points.len());
            for (index, (point, &(row, col))) in points.iter().zip(&centers).enumerate() {
                let neighbor = cell_id_from_row_col(row + row_offset as i64, col + col_offset as i64)
                    .ok_or_else(|| {
                        HazardError::InvalidInput(format!(
                            "neighborhood of point {} ({}, {}) extends beyond the pole",
                            index, point.lat, point.lon
                        ))
                    })?;
                let (lat, lon) = grid::cell_bounds(neighbor).center();
                offset_points.push(QueryPoint {
                    lat,
                    lon,
                    location_id: point.location_id.clone(),
                });
            }

            layers.push(Layer {
                row_offset,
                col_offset,
                points: offset_points,
            });
        }
    }

    Ok(layers)
}

/// Rows of a single center layer with provenance for a 1-cell neighborhood.
pub fn single_cell(rows: Vec<JoinedRow>, spec: &RegridSpec) -> Vec<AggregatedRow> {
    rows.into_iter()
        .map(|row| {
            let provenance = match spec {
                RegridSpec::None => Provenance::Point,
                RegridSpec::Halo { .. } => Provenance::Halo {
                    row_offset: 0,
                    col_offset: 0,
                },
                RegridSpec::Resolution { reducer, .. } => Provenance::Regrid {
                    resolution_deg: RESOLUTION_DEG,
                    reducer: *reducer,
                    cells_used: usize::from(row.feature.has_value()),
                },
            };
            AggregatedRow::from_joined(row, provenance)
        })
        .collect()
}

/// Emit every layer, grouped by point then layer order.
pub fn halo(layers: Vec<LayerRows>, num_points: usize) -> Vec<AggregatedRow> {
    let mut per_point: Vec<Vec<AggregatedRow>> = vec![Vec::new(); num_points];

    for layer in layers {
        let provenance = Provenance::Halo {
            row_offset: layer.row_offset,
            col_offset: layer.col_offset,
        };
        for row in layer.rows {
            if let Some(bucket) = per_point.get_mut(row.point_index) {
                bucket.push(AggregatedRow::from_joined(row, provenance));
            }
        }
    }

    per_point.into_iter().flatten().collect()
}

/// Reduce the layers into one row per point.
///
/// The center layer supplies every non-value field. `NO CONTENT` cells are
/// left out of the reduction; a point with no value anywhere stays
/// `NO CONTENT`.
pub fn regrid(
    layers: &[LayerRows],
    num_points: usize,
    side_len: u32,
    reducer: Reducer,
) -> HazardResult<Vec<AggregatedRow>> {
    check_side_len("side_len", side_len)?;

    let expected_layers = side_len as usize * side_len as usize;
    if layers.len() != expected_layers {
        return Err(HazardError::Integrity(format!(
            "expected {} layers for side length {}, got {}",
            expected_layers,
            side_len,
            layers.len()
        )));
    }

    let center = layers
        .iter()
        .find(|l| l.row_offset == 0 && l.col_offset == 0)
        .ok_or_else(|| HazardError::Integrity("center layer missing".to_string()))?;

    let mut values: Vec<Vec<f64>> = vec![Vec::new(); num_points];
    let mut cells: Vec<Vec<u64>> = vec![Vec::with_capacity(expected_layers); num_points];

    for layer in layers {
        let mut first_seen = vec![false; num_points];
        for row in &layer.rows {
            let p = row.point_index;
            if p >= num_points {
                return Err(HazardError::Integrity(format!(
                    "layer row refers to unknown point index {}",
                    p
                )));
            }
            if !first_seen[p] {
                first_seen[p] = true;
                cells[p].push(row.feature.cell_id);
            }
            if let (true, Some(v)) = (row.feature.has_value(), row.feature.wind_speed) {
                values[p].push(v);
            }
        }
    }

    let mut output = Vec::with_capacity(num_points);
    let mut center_rows: Vec<Option<&JoinedRow>> = vec![None; num_points];
    for row in &center.rows {
        if let Some(slot) = center_rows.get_mut(row.point_index) {
            slot.get_or_insert(row);
        }
    }

    for (p, center_row) in center_rows.into_iter().enumerate() {
        let center_row = center_row.ok_or_else(|| {
            HazardError::Integrity(format!("point {} has no center row", p))
        })?;

        verify_neighborhood(&cells[p], side_len)?;

        let mut feature = center_row.feature.clone();
        match reducer.reduce(&values[p]) {
            Some(v) => {
                feature.wind_speed = Some(v);
                feature.status = FeatureStatus::Ok;
            }
            None => {
                feature.wind_speed = None;
                feature.status = FeatureStatus::NoContent;
            }
        }

        output.push(AggregatedRow {
            point_index: p,
            location_id: center_row.location_id.clone(),
            lat: center_row.lat,
            lon: center_row.lon,
            feature,
            provenance: Provenance::Regrid {
                resolution_deg: RESOLUTION_DEG * side_len as f64,
                reducer,
                cells_used: values[p].len(),
            },
            conversion: None,
        });
    }

    Ok(output)
}

/// Check that cells form a contiguous `side_len x side_len` square.
///
/// Requires `side_len²` distinct cells spanning exactly `side_len` rows and
/// `side_len` columns (columns wrap), whose union covers `(R * side_len)²`
/// square degrees.
pub fn verify_neighborhood(cell_ids: &[u64], side_len: u32) -> HazardResult<()> {
    let side = side_len as i64;
    let unique: BTreeSet<u64> = cell_ids.iter().copied().collect();

    if unique.len() as i64 != side * side {
        return Err(HazardError::Integrity(format!(
            "neighborhood has {} distinct cells, expected {}",
            unique.len(),
            side * side
        )));
    }

    let nc = NUM_COLUMNS as i64;
    let Some(&anchor) = unique.iter().next() else {
        return Err(HazardError::Integrity("empty neighborhood".to_string()));
    };
    let anchor_col = row_col_of(anchor).1 as i64;

    let mut min_row = i64::MAX;
    let mut max_row = i64::MIN;
    let mut min_col = i64::MAX;
    let mut max_col = i64::MIN;
    for &id in &unique {
        let (row, col) = row_col_of(id);
        // column distance from the anchor in [-nc/2, nc/2)
        let rel = (col as i64 - anchor_col + nc / 2).rem_euclid(nc) - nc / 2;
        min_row = min_row.min(row as i64);
        max_row = max_row.max(row as i64);
        min_col = min_col.min(rel);
        max_col = max_col.max(rel);
    }

    let rows = max_row - min_row + 1;
    let cols = max_col - min_col + 1;
    if rows != side || cols != side {
        return Err(HazardError::Integrity(format!(
            "neighborhood spans {} rows x {} columns, expected {} x {}",
            rows, cols, side, side
        )));
    }

    let expected_area = (RESOLUTION_DEG * side_len as f64).powi(2);
    let union_area: f64 = unique.iter().map(|&id| grid::cell_bounds(id).area()).sum();
    let extent_area = (cols as f64 * RESOLUTION_DEG) * (rows as f64 * RESOLUTION_DEG);
    let tolerance = expected_area * 1e-9;
    if (union_area - expected_area).abs() > tolerance || (extent_area - expected_area).abs() > tolerance {
        return Err(HazardError::Integrity(format!(
            "neighborhood area {} does not match expected {}",
            union_area, expected_area
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hazard_common::grid::cell_id_of;
    use hazard_common::{ErrorCategory, HazardQuery, QueryEcho};

    fn joined(point_index: usize, cell_id: u64, wind_speed: Option<f64>) -> JoinedRow {
        let request = HazardQuery {
            return_period: Some(100),
            ..Default::default()
        }
        .service_request();
        let echo = QueryEcho::from_request(&request);
        let mut feature = HazardFeature::no_content(cell_id, echo, Some(100));
        if let Some(v) = wind_speed {
            feature.wind_speed = Some(v);
            feature.status = FeatureStatus::Ok;
        }
        JoinedRow {
            point_index,
            location_id: Some(format!("loc-{}", point_index)),
            lat: 0.0,
            lon: 0.0,
            feature,
        }
    }

    /// Layers around one point with the given value per layer (row-major).
    fn layers_with_values(lat: f64, lon: f64, values: &[Option<f64>]) -> Vec<LayerRows> {
        let side = (values.len() as f64).sqrt() as u32;
        let layers = offset_layers(&[QueryPoint::new(lat, lon)], side).unwrap();
        layers
            .into_iter()
            .zip(values)
            .map(|(layer, value)| {
                let cell = cell_id_of(layer.points[0].lat, layer.points[0].lon);
                LayerRows {
                    row_offset: layer.row_offset,
                    col_offset: layer.col_offset,
                    rows: vec![joined(0, cell, *value)],
                }
            })
            .collect()
    }

    #[test]
    fn test_reducers() {
        let values = [10.0, 20.0, 30.0, 40.0, 50.0];
        assert_eq!(Reducer::Mean.reduce(&values), Some(30.0));
        assert_eq!(Reducer::Median.reduce(&values), Some(30.0));
        assert_eq!(Reducer::Max.reduce(&values), Some(50.0));
        assert_eq!(Reducer::Median.reduce(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(Reducer::Mean.reduce(&[]), None);
    }

    #[test]
    fn test_reducer_parse() {
        assert_eq!("MEDIAN".parse::<Reducer>().unwrap(), Reducer::Median);
        assert!("sum".parse::<Reducer>().is_err());
    }

    #[test]
    fn test_regrid_spec_options() {
        assert_eq!(
            RegridSpec::from_options(None, None, Reducer::Mean).unwrap(),
            RegridSpec::None
        );
        assert_eq!(
            RegridSpec::from_options(Some(2), None, Reducer::Mean).unwrap().side_len(),
            5
        );
        assert!(RegridSpec::from_options(Some(1), Some(3), Reducer::Mean).is_err());
        assert!(RegridSpec::from_options(None, Some(4), Reducer::Max).is_err());
        assert!(RegridSpec::from_options(None, Some(0), Reducer::Max).is_err());
    }

    #[test]
    fn test_oversized_neighborhoods_rejected() {
        let err = RegridSpec::from_options(Some(u32::MAX / 2 + 1), None, Reducer::Mean).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(RegridSpec::Halo { halo_size: u32::MAX }.side_len(), u32::MAX);

        let max_halo = MAX_SIDE_LEN / 2;
        assert_eq!(
            RegridSpec::from_options(Some(max_halo), None, Reducer::Mean).unwrap().side_len(),
            MAX_SIDE_LEN
        );
        assert!(RegridSpec::from_options(Some(max_halo + 1), None, Reducer::Mean).is_err());

        assert!(RegridSpec::from_options(None, Some(MAX_SIDE_LEN), Reducer::Max).is_ok());
        assert!(RegridSpec::from_options(None, Some(MAX_SIDE_LEN + 2), Reducer::Max).is_err());
        assert!(RegridSpec::from_options(None, Some(65_537), Reducer::Max).is_err());

        let err = offset_layers(&[QueryPoint::new(0.0, 0.0)], 65_537).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Input);
        assert!(regrid(&[], 1, 65_537, Reducer::Mean).is_err());
    }

    #[test]
    fn test_neighborhood_requires_fixed_value_query() {
        let spec = RegridSpec::Halo { halo_size: 1 };
        assert!(spec.validate_for(QueryKind::FullHistory).is_err());
        assert!(spec.validate_for(QueryKind::FixedValue).is_ok());
        assert!(RegridSpec::None.validate_for(QueryKind::FullHistory).is_ok());
    }

    #[test]
    fn test_offset_layers_cover_square() {
        let point = QueryPoint::new(25.1234, -80.5678).with_location_id("x");
        let layers = offset_layers(&[point.clone()], 3).unwrap();

        assert_eq!(layers.len(), 9);
        assert_eq!(layers[4].points[0], point);
        assert!(layers[4].is_center());
        assert_eq!((layers[0].row_offset, layers[0].col_offset), (-1, -1));
        assert!(layers.iter().all(|l| l.points[0].location_id.as_deref() == Some("x")));

        let cells: Vec<u64> = layers
            .iter()
            .map(|l| cell_id_of(l.points[0].lat, l.points[0].lon))
            .collect();
        assert!(verify_neighborhood(&cells, 3).is_ok());

        let (center_row, center_col) = row_col_of(cell_id_of(point.lat, point.lon));
        let (row, col) = row_col_of(cells[0]);
        assert_eq!((row + 1, col + 1), (center_row, center_col));
    }

    #[test]
    fn test_offset_layers_across_antimeridian() {
        let point = QueryPoint::new(-17.5, 179.999);
        let layers = offset_layers(&[point], 5).unwrap();
        let cells: Vec<u64> = layers
            .iter()
            .map(|l| cell_id_of(l.points[0].lat, l.points[0].lon))
            .collect();
        assert!(verify_neighborhood(&cells, 5).is_ok());
        assert!(layers.iter().any(|l| l.points[0].lon < 0.0));
    }

    #[test]
    fn test_offset_layers_beyond_pole() {
        let err = offset_layers(&[QueryPoint::new(89.9999, 0.0)], 3).unwrap_err();
        assert!(matches!(err, HazardError::InvalidInput(_)));
    }

    #[test]
    fn test_verify_neighborhood_rejects_gaps() {
        let center = cell_id_of(10.0, 10.0);
        let (row, col) = row_col_of(center);
        let mut cells: Vec<u64> = (-1..=1)
            .flat_map(|dr| (-1..=1).map(move |dc| (dr, dc)))
            .filter_map(|(dr, dc)| cell_id_from_row_col(row as i64 + dr, col as i64 + dc))
            .collect();
        assert!(verify_neighborhood(&cells, 3).is_ok());

        // shift one cell two columns away
        cells[8] = cell_id_from_row_col(row as i64 + 1, col as i64 + 3).unwrap();
        assert!(verify_neighborhood(&cells, 3).is_err());

        cells[8] = cells[7];
        assert!(verify_neighborhood(&cells, 3).is_err());
    }

    #[test]
    fn test_regrid_reduces_neighborhood() {
        let values: Vec<Option<f64>> = (1..=9).map(|v| Some(v as f64 * 10.0)).collect();
        let layers = layers_with_values(25.1, -80.2, &values);

        let mean = regrid(&layers, 1, 3, Reducer::Mean).unwrap();
        assert_eq!(mean.len(), 1);
        assert_eq!(mean[0].feature.wind_speed, Some(50.0));
        assert_eq!(mean[0].feature.cell_id, cell_id_of(25.1, -80.2));
        match mean[0].provenance {
            Provenance::Regrid {
                resolution_deg,
                reducer,
                cells_used,
            } => {
                assert_eq!(resolution_deg, 3.0 * RESOLUTION_DEG);
                assert_eq!(reducer, Reducer::Mean);
                assert_eq!(cells_used, 9);
            }
            other => panic!("unexpected provenance {:?}", other),
        }

        let max = regrid(&layers, 1, 3, Reducer::Max).unwrap();
        assert_eq!(max[0].feature.wind_speed, Some(90.0));
    }

    #[test]
    fn test_regrid_skips_no_content() {
        let mut values: Vec<Option<f64>> = vec![None; 9];
        values[0] = Some(10.0);
        values[4] = Some(30.0);
        values[8] = Some(50.0);
        let layers = layers_with_values(25.1, -80.2, &values);

        let median = regrid(&layers, 1, 3, Reducer::Median).unwrap();
        assert_eq!(median[0].feature.wind_speed, Some(30.0));
        assert_eq!(median[0].feature.status, FeatureStatus::Ok);

        let mean = regrid(&layers, 1, 3, Reducer::Mean).unwrap();
        assert_eq!(mean[0].feature.wind_speed, Some(30.0));

        // the largest raw value sits in a NO CONTENT cell
        let mut layers = layers_with_values(25.1, -80.2, &values);
        layers[2].rows[0].feature.wind_speed = Some(99.0);
        assert_eq!(layers[2].rows[0].feature.status, FeatureStatus::NoContent);

        let max = regrid(&layers, 1, 3, Reducer::Max).unwrap();
        assert_eq!(max[0].feature.wind_speed, Some(50.0));
        assert_eq!(max[0].feature.status, FeatureStatus::Ok);
        assert!(matches!(max[0].provenance, Provenance::Regrid { cells_used: 3, .. }));
    }

    #[test]
    fn test_regrid_all_no_content() {
        let layers = layers_with_values(25.1, -80.2, &[None; 9]);
        let rows = regrid(&layers, 1, 3, Reducer::Max).unwrap();
        assert_eq!(rows[0].feature.status, FeatureStatus::NoContent);
        assert_eq!(rows[0].feature.wind_speed, None);
    }

    #[test]
    fn test_regrid_detects_bad_offsets() {
        let values: Vec<Option<f64>> = (1..=9).map(|v| Some(v as f64)).collect();
        let mut layers = layers_with_values(25.1, -80.2, &values);
        // collapse one neighbor onto the center cell
        layers[0].rows[0].feature.cell_id = cell_id_of(25.1, -80.2);

        let err = regrid(&layers, 1, 3, Reducer::Mean).unwrap_err();
        assert!(matches!(err, HazardError::Integrity(_)));
    }

    #[test]
    fn test_halo_groups_by_point() {
        let point_layers = |offset: i32| LayerRows {
            row_offset: offset,
            col_offset: 0,
            rows: vec![joined(0, 1, Some(1.0)), joined(1, 2, Some(2.0))],
        };
        let rows = halo(vec![point_layers(-1), point_layers(0), point_layers(1)], 2);

        assert_eq!(rows.len(), 6);
        let order: Vec<(usize, Provenance)> = rows.iter().map(|r| (r.point_index, r.provenance)).collect();
        assert_eq!(order[0].0, 0);
        assert_eq!(order[2].0, 0);
        assert_eq!(order[3].0, 1);
        assert_eq!(
            order[2].1,
            Provenance::Halo {
                row_offset: 1,
                col_offset: 0
            }
        );
    }

    #[test]
    fn test_single_cell_passthrough() {
        let rows = vec![joined(0, 7, Some(42.0))];
        let out = single_cell(
            rows,
            &RegridSpec::Resolution {
                side_len: 1,
                reducer: Reducer::Median,
            },
        );
        assert_eq!(out[0].feature.wind_speed, Some(42.0));
        assert!(matches!(
            out[0].provenance,
            Provenance::Regrid { cells_used: 1, .. }
        ));
    }
}
