//! Splitting query points into remote calls.

use hazard_common::{QueryKind, QueryPoint};

use crate::config::EngineConfig;

/// An ordered slice of the input submitted in one remote call.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Position of this batch in the plan.
    pub index: usize,
    /// Index of each point in the original input.
    pub point_indices: Vec<usize>,
    pub points: Vec<QueryPoint>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Points per remote call for a query kind.
///
/// Full-history queries expand every point into its whole event set on the
/// service side, so they are sent far fewer points at a time.
pub fn batch_size_for(kind: QueryKind, config: &EngineConfig) -> usize {
    let size = match kind {
        QueryKind::FullHistory => config.full_history_batch_size,
        QueryKind::FixedValue => config.fixed_value_batch_size,
    };
    size.max(1)
}

/// Split points into non-empty, order-preserving batches.
pub fn plan_batches(points: &[QueryPoint], kind: QueryKind, config: &EngineConfig) -> Vec<Batch> {
    let size = batch_size_for(kind, config);

    points
        .chunks(size)
        .enumerate()
        .map(|(index, chunk)| {
            let start = index * size;
            Batch {
                index,
                point_indices: (start..start + chunk.len()).collect(),
                points: chunk.to_vec(),
            }
        })
        .collect()
}
