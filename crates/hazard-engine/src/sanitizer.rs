//! Return-period substitution detection.

use hazard_common::FeatureStatus;
use tracing::debug;

use crate::joiner::FeatureRow;

/// Normalize rows whose return period differs from the requested one.
///
/// The service answers with the nearest available return period when the
/// requested one is missing for a location. Such rows are reset to
/// `NO CONTENT` at the requested return period. Returns how many rows were
/// changed. Does nothing when no return period was requested.
pub fn sanitize<R: FeatureRow>(rows: &mut [R], requested: Option<u32>) -> usize {
    let Some(requested) = requested else {
        return 0;
    };

    let mut changed = 0;
    for row in rows.iter_mut() {
        let feature = row.feature_mut();
        match feature.return_period {
            Some(returned) if returned != requested => {
                debug!(
                    cell_id = feature.cell_id,
                    requested = requested,
                    returned = returned,
                    "Service substituted return period"
                );
                feature.wind_speed = None;
                feature.status = FeatureStatus::NoContent;
                feature.return_period = Some(requested);
                changed += 1;
            }
            _ => {}
        }
    }

    changed
}
