//! Attaching query points to the features of their grid cell.
//!
//! The grid is regular, so a point is matched to features by computing its
//! cell id rather than by testing polygon containment.

use std::collections::{HashMap, HashSet};

use hazard_common::grid::cell_id_of;
use hazard_common::{HazardError, HazardFeature, HazardResult, QueryEcho, QueryPoint, ServiceRequest};

/// A feature joined to the query point it answers.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow {
    /// Index of the point in the original input.
    pub point_index: usize,
    pub location_id: Option<String>,
    /// Coordinates as supplied by the caller.
    pub lat: f64,
    pub lon: f64,
    pub feature: HazardFeature,
}

/// Access to the hazard feature carried by a row type.
pub trait FeatureRow {
    fn feature(&self) -> &HazardFeature;
    fn feature_mut(&mut self) -> &mut HazardFeature;
}

impl FeatureRow for JoinedRow {
    fn feature(&self) -> &HazardFeature {
        &self.feature
    }

    fn feature_mut(&mut self) -> &mut HazardFeature {
        &mut self.feature
    }
}

/// Join features to points.
///
/// `originals[i]` is the caller's point and `queried[i]` the location that was
/// actually sent for it (the same point for the center layer, a neighbor for
/// offset layers). Every feature in the cell of `queried[i]` is attached, in
/// feature order. A point whose cell has no feature gets a `NO CONTENT` row
/// so that it is never dropped.
pub fn join(
    originals: &[QueryPoint],
    queried: &[QueryPoint],
    features: &[HazardFeature],
    request: &ServiceRequest,
) -> HazardResult<Vec<JoinedRow>> {
    if originals.len() != queried.len() {
        return Err(HazardError::Internal(format!(
            "joining {} queried points to {} inputs",
            queried.len(),
            originals.len()
        )));
    }

    let mut by_cell: HashMap<u64, Vec<&HazardFeature>> = HashMap::new();
    for feature in features {
        by_cell.entry(feature.cell_id).or_default().push(feature);
    }

    let echo = QueryEcho::from_request(request);
    let mut rows = Vec::with_capacity(originals.len());

    for (point_index, (original, sent)) in originals.iter().zip(queried).enumerate() {
        let cell_id = cell_id_of(sent.lat, sent.lon);

        let row = |feature: HazardFeature| JoinedRow {
            point_index,
            location_id: original.location_id.clone(),
            lat: original.lat,
            lon: original.lon,
            feature,
        };

        match by_cell.get(&cell_id) {
            Some(matches) => rows.extend(matches.iter().map(|f| row((*f).clone()))),
            None => rows.push(row(HazardFeature::no_content(
                cell_id,
                echo.clone(),
                request.return_period,
            ))),
        }
    }

    Ok(rows)
}

/// Check that the join neither lost nor invented a query point.
pub fn verify_identity(points: &[QueryPoint], rows: &[JoinedRow]) -> HazardResult<()> {
    let mut seen = vec![false; points.len()];

    for row in rows {
        match seen.get_mut(row.point_index) {
            Some(slot) => *slot = true,
            None => {
                return Err(HazardError::Integrity(format!(
                    "joined row refers to unknown point index {}",
                    row.point_index
                )))
            }
        }

        let expected = points[row.point_index].location_id.as_deref();
        if row.location_id.as_deref() != expected {
            return Err(HazardError::Integrity(format!(
                "point {} joined with location_id {:?}, expected {:?}",
                row.point_index, row.location_id, expected
            )));
        }
    }

    if let Some(missing) = seen.iter().position(|s| !s) {
        return Err(HazardError::Integrity(format!(
            "point {} ({}, {}) missing from joined result",
            missing, points[missing].lat, points[missing].lon
        )));
    }

    let input_ids: HashSet<&str> = points.iter().filter_map(|p| p.location_id.as_deref()).collect();
    let joined_ids: HashSet<&str> = rows.iter().filter_map(|r| r.location_id.as_deref()).collect();
    if input_ids != joined_ids {
        return Err(HazardError::Integrity(format!(
            "joined location ids differ from input: {} input, {} joined",
            input_ids.len(),
            joined_ids.len()
        )));
    }

    Ok(())
}
