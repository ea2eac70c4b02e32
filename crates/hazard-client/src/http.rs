//! HTTP implementation of [`HazardApi`].

use std::time::{Duration, Instant};

use async_trait::async_trait;
use hazard_common::{HazardResponse, HazardResult, QueryPoint, ServiceRequest};
use reqwest::{header, Client, Request, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::api::{AccessToken, HazardApi};
use crate::auth::Credentials;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::wire::WireResponse;

/// Header selecting a specific product version on the service.
const PRODUCT_VERSION_HEADER: &str = "product-version";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Client for the remote hazard API.
pub struct HttpHazardClient {
    client: Client,
    config: ClientConfig,
    credentials: Credentials,
}

impl HttpHazardClient {
    /// Create a new client.
    pub fn new(config: ClientConfig, credentials: Credentials) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()?;

        Ok(Self {
            client,
            config,
            credentials,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build the GET request for one batch without sending it.
    fn build_query(
        &self,
        token: &AccessToken,
        points: &[QueryPoint],
        request: &ServiceRequest,
    ) -> Result<Request, ClientError> {
        let url = self.config.endpoint_url(&request.endpoint.path(request.product));

        let mut params: Vec<(&str, String)> = Vec::with_capacity(points.len() * 2 + 6);
        for point in points {
            params.push(("lat", point.lat.to_string()));
        }
        for point in points {
            params.push(("lon", point.lon.to_string()));
        }
        params.extend(request.query_params());

        let mut builder = self
            .client
            .get(url)
            .bearer_auth(token.secret())
            .header(header::ACCEPT, "application/json")
            .query(&params);

        if let Some(version) = &request.product_version {
            builder = builder.header(PRODUCT_VERSION_HEADER, version);
        }

        let req = builder.build()?;

        let length = req.url().as_str().len();
        if length > self.config.max_url_bytes {
            return Err(ClientError::UrlTooLong {
                length,
                limit: self.config.max_url_bytes,
            });
        }

        Ok(req)
    }

    async fn send_query(
        &self,
        token: &AccessToken,
        points: &[QueryPoint],
        request: &ServiceRequest,
    ) -> Result<HazardResponse, ClientError> {
        let req = self.build_query(token, points, request)?;
        let endpoint = request.endpoint.path(request.product);

        let start = Instant::now();
        let response = self.client.execute(req).await?;
        let status = response.status();
        let body = response.bytes().await?;
        let elapsed_ms = start.elapsed().as_millis();

        info!(
            endpoint = %endpoint,
            points = points.len(),
            status = status.as_u16(),
            elapsed_ms = elapsed_ms as u64,
            "querying {} took {}ms",
            endpoint,
            elapsed_ms
        );

        if status != StatusCode::OK {
            let message = error_detail(&body);
            warn!(status = status.as_u16(), message = %message, "Remote query failed");
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        WireResponse::from_slice(&body)?.into_response(request)
    }
}

#[async_trait]
impl HazardApi for HttpHazardClient {
    #[instrument(skip(self), fields(auth_url = %self.config.auth_url))]
    async fn authenticate(&self) -> HazardResult<AccessToken> {
        let form = [
            ("username", self.credentials.username.as_str()),
            ("password", self.credentials.password.as_str()),
        ];

        let response = self
            .client
            .post(&self.config.auth_url)
            .form(&form)
            .send()
            .await
            .map_err(ClientError::from)?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.bytes().await.map_err(ClientError::from)?;
            return Err(ClientError::Auth(format!(
                "token endpoint returned HTTP {}: {}",
                status.as_u16(),
                error_detail(&body)
            ))
            .into());
        }

        let body = response.bytes().await.map_err(ClientError::from)?;
        let token: TokenResponse = serde_json::from_slice(&body).map_err(ClientError::from)?;
        let value = token
            .access_token
            .ok_or_else(|| ClientError::Auth("token response has no access_token".to_string()))?;

        debug!("Obtained access token");
        Ok(AccessToken::new(value))
    }

    #[instrument(
        skip(self, token, points, request),
        fields(endpoint = %request.endpoint.path(request.product), points = points.len())
    )]
    async fn query_points(
        &self,
        token: &AccessToken,
        points: &[QueryPoint],
        request: &ServiceRequest,
    ) -> HazardResult<HazardResponse> {
        Ok(self.send_query(token, points, request).await?)
    }
}

/// Best-effort message from an error response body.
fn error_detail(body: &[u8]) -> String {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(s),
        }) => s,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => String::from_utf8_lossy(body).chars().take(512).collect(),
    }
}
