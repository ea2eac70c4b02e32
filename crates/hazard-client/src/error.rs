//! Error types for the HTTP client.

use hazard_common::HazardError;
use thiserror::Error;

/// Errors that can occur while talking to the remote service.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Connection, timeout or body transfer failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("API returned HTTP {status} with {message}")]
    Status { status: u16, message: String },

    /// The encoded request URL exceeds the service limit.
    #[error("request url is too long: {length} > {limit} bytes")]
    UrlTooLong { length: usize, limit: usize },

    /// The response body did not have the expected shape.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The token endpoint rejected the credentials.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// No usable credentials were found.
    #[error("credentials not available: {0}")]
    Credentials(String),
}

impl ClientError {
    /// Create a Parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<ClientError> for HazardError {
    fn from(err: ClientError) -> Self {
        let message = err.to_string();
        match err {
            ClientError::Http(_) => HazardError::Transport(message),
            ClientError::Auth(_) | ClientError::Credentials(_) => {
                HazardError::Authentication(message)
            }
            ClientError::Status { .. } | ClientError::UrlTooLong { .. } | ClientError::Parse(_) => {
                HazardError::Remote(message)
            }
        }
    }
}
