//! Error types for the Bexio SDK.

use bexio_core::RemoteError;
use serde::{Deserialize, Serialize};

/// Result type for SDK operations.
pub type SdkResult<T> = Result<T, SdkError>;

/// Error types that can occur when talking to the Bexio API.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Response body was not the expected JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl SdkError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// HTTP status, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Create an API error from a status code and response body.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = match serde_json::from_str::<ErrorResponse>(body) {
            Ok(error_response) => error_response.message,
            Err(_) if body.trim().is_empty() => format!("HTTP {}", status),
            Err(_) => body.to_string(),
        };
        Self::Api { status, message }
    }
}

impl From<SdkError> for RemoteError {
    fn from(err: SdkError) -> Self {
        match err {
            SdkError::Api { status, message } => RemoteError::new(Some(status), message),
            other => RemoteError::new(other.status(), other.to_string()),
        }
    }
}

/// Error body returned by the Bexio API.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u16>,
    pub message: String,
}
