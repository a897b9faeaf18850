use core::result::Result as CoreResult;

use reqwest::{Error as ReqwestError, StatusCode};
use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = CoreResult<T, Error>;

/// Error codes in a 400/422 body that name the model rather than the request.
const MODEL_ERROR_CODES: [&str; 3] = [
    "model_not_found",
    "model_decommissioned",
    "model_not_active",
];

/// Errors that can occur while talking to a generation backend.
#[derive(Debug, Error)]
pub enum Error {
    /// An HTTP request failed before a response was received.
    #[error("HTTP request failed: {0}")]
    Request(#[from] ReqwestError),

    /// Required API key was not found.
    #[error("API key not found: {0}")]
    MissingApiKey(String),

    /// The backend rejected the credentials.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The backend refused the request because of rate limiting.
    ///
    /// Free-tier limits are applied per model, so other models on the same
    /// backend stay usable.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The requested model is not served by this backend.
    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),

    /// The backend rejected this particular request (400 or 422).
    #[error("Rejected request: {0}")]
    RejectedRequest(String),

    /// Model provider returned an invalid response.
    #[error("Invalid response from provider: {0}")]
    InvalidResponse(String),

    /// The call did not complete within its time budget.
    #[error("Timeout after {0}ms")]
    Timeout(u64),

    /// A model provider encountered an error.
    #[error("Provider error: {0}")]
    Provider(String),
}

impl Error {
    /// Maps a non-success HTTP status returned by `provider` to an error variant.
    pub fn from_status(provider: &str, status: StatusCode, body: &str) -> Self {
        let detail = format!("{provider} API error {status}: {body}");
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Authentication(detail),
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited(detail),
            StatusCode::NOT_FOUND => Self::UnsupportedModel(detail),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                if MODEL_ERROR_CODES.iter().any(|code| body.contains(code)) {
                    Self::UnsupportedModel(detail)
                } else {
                    Self::RejectedRequest(detail)
                }
            }
            _ => Self::Provider(detail),
        }
    }

    /// Determines whether the failure is attributable to the backend itself
    /// rather than to the specific model or request.
    ///
    /// Provider faults open the backend's circuit breaker in the dispatcher.
    /// Unsupported models, rejected requests and rate limits only move
    /// dispatch on to the next candidate.
    pub fn is_provider_fault(&self) -> bool {
        !matches!(
            self,
            Self::UnsupportedModel(_) | Self::RejectedRequest(_) | Self::RateLimited(_)
        )
    }
}
