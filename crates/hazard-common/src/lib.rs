//! Common types and utilities shared across the hazard workspace.

pub mod bounds;
pub mod error;
pub mod feature;
pub mod grid;
pub mod point;
pub mod query;

pub use bounds::CellBounds;
pub use error::{ErrorCategory, HazardError, HazardResult};
pub use feature::{FeatureStatus, HazardFeature, HazardResponse, QueryEcho, ResponseHeader};
pub use grid::{cell_id_of, lower_left_of, RESOLUTION_DEG};
pub use point::{validate_points, QueryPoint};
pub use query::{
    AveragingPeriod, Endpoint, HazardQuery, Product, QueryKind, ServiceRequest, TerrainCorrection,
    WindSpeedUnits,
};
