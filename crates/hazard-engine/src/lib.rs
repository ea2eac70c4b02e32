//! Spatial hazard aggregation engine.
//!
//! Takes a list of query locations, fetches per-location hazard values from
//! the remote point-query service in bounded batches, and produces one
//! consistent table, optionally expanded into a halo of neighbor cells or
//! regridded to a coarser resolution.
//!
//! ```text
//! batcher -> dispatcher -> merger -> joiner -> regrid -> units -> sanitizer
//! ```

pub mod batcher;
pub mod config;
pub mod dispatcher;
pub mod joiner;
pub mod merger;
pub mod pipeline;
pub mod regrid;
pub mod sanitizer;
pub mod units;

pub use batcher::{plan_batches, Batch};
pub use config::EngineConfig;
pub use dispatcher::{BatchResult, FetchDispatcher, WorkerSession};
pub use joiner::{join, verify_identity, FeatureRow, JoinedRow};
pub use merger::{dedup_rows, merge_batches};
pub use pipeline::HazardPipeline;
pub use regrid::{AggregatedRow, Conversion, Provenance, Reducer, RegridSpec, MAX_SIDE_LEN};
pub use sanitizer::sanitize;
pub use units::convert_to_ten_minutes;
