//! Error types for hazard aggregation.

use thiserror::Error;

/// Result type alias using HazardError.
pub type HazardResult<T> = Result<T, HazardError>;

/// Primary error type for the hazard pipeline.
#[derive(Debug, Error)]
pub enum HazardError {
    // === Input Errors ===
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    // === Remote Service Errors ===
    #[error("Remote service error: {0}")]
    Remote(String),

    #[error("Response header mismatch for '{field}': requested '{expected}', service returned '{actual}'")]
    HeaderMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Transport error: {0}")]
    Transport(String),

    // === Defects ===
    #[error("Integrity check failed: {0}")]
    Integrity(String),

    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`HazardError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller supplied bad points or configuration. Detected before any remote call.
    Input,
    /// The remote service failed or answered inconsistently.
    Remote,
    /// The engine produced inconsistent data.
    Integrity,
    /// A conversion was invoked outside its valid domain.
    Precondition,
    /// Task or runtime failure.
    Internal,
}

impl HazardError {
    /// Create an InvalidParameter error.
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create a HeaderMismatch error.
    pub fn header_mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::HeaderMismatch {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            HazardError::InvalidInput(_) | HazardError::InvalidParameter { .. } => {
                ErrorCategory::Input
            }

            HazardError::Remote(_)
            | HazardError::HeaderMismatch { .. }
            | HazardError::Authentication(_)
            | HazardError::Transport(_) => ErrorCategory::Remote,

            HazardError::Integrity(_) => ErrorCategory::Integrity,
            HazardError::Precondition(_) => ErrorCategory::Precondition,
            HazardError::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Input => 2,
            ErrorCategory::Remote => 3,
            ErrorCategory::Integrity => 4,
            ErrorCategory::Precondition => 5,
            ErrorCategory::Internal => 1,
        }
    }
}

impl From<serde_json::Error> for HazardError {
    fn from(err: serde_json::Error) -> Self {
        HazardError::Remote(format!("JSON error: {}", err))
    }
}
