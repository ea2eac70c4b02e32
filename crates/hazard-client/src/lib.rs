//! Client side of the remote hazard point-query service.
//!
//! The engine only talks to the service through the [`HazardApi`] trait:
//!
//! ```text
//! HazardApi::authenticate()           -> AccessToken
//! HazardApi::query_points(token, ..)  -> HazardResponse { header, features }
//! ```
//!
//! [`HttpHazardClient`] is the production implementation. It posts
//! credentials to the token endpoint, then issues bearer-authenticated GET
//! requests with repeated `lat`/`lon` parameters and decodes the GeoJSON
//! feature collection the service answers with.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod http;
mod wire;

pub use api::{AccessToken, HazardApi};
pub use auth::Credentials;
pub use config::ClientConfig;
pub use error::ClientError;
pub use http::HttpHazardClient;
