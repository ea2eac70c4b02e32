//! The remote service seam.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hazard_common::{HazardResponse, HazardResult, QueryPoint, ServiceRequest};

/// Bearer token for one authenticated session.
#[derive(Clone)]
pub struct AccessToken {
    value: String,
    issued_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            issued_at: Utc::now(),
        }
    }

    /// Raw token for the `Authorization` header.
    pub fn secret(&self) -> &str {
        &self.value
    }

    /// Wall-clock time the token was obtained.
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// A remote service answering hazard point queries.
#[async_trait]
pub trait HazardApi: Send + Sync {
    /// Obtain a fresh access token.
    async fn authenticate(&self) -> HazardResult<AccessToken>;

    /// Query one batch of points.
    async fn query_points(
        &self,
        token: &AccessToken,
        points: &[QueryPoint],
        request: &ServiceRequest,
    ) -> HazardResult<HazardResponse>;
}

#[async_trait]
impl<T: HazardApi + ?Sized> HazardApi for Arc<T> {
    async fn authenticate(&self) -> HazardResult<AccessToken> {
        (**self).authenticate().await
    }

    async fn query_points(
        &self,
        token: &AccessToken,
        points: &[QueryPoint],
        request: &ServiceRequest,
    ) -> HazardResult<HazardResponse> {
        (**self).query_points(token, points, request).await
    }
}
