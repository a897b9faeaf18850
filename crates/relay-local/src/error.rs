use core::result::Result as CoreResult;
use thiserror::Error;

/// Result type for local backend operations.
pub type Result<T> = CoreResult<T, LocalError>;

/// Errors raised by the Ollama backend.
#[derive(Debug, Error)]
pub enum LocalError {
    /// The HTTP call or body decoding failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The daemon could not be reached or answered with a failure status.
    #[error("Ollama not available: {0}")]
    OllamaUnavailable(String),

    /// The model tag is not installed.
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// The daemon accepted the call but generation failed.
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
}

impl From<LocalError> for relay_core::Error {
    fn from(error: LocalError) -> Self {
        match error {
            LocalError::Http(err) => Self::Request(err),
            LocalError::ModelNotFound(model) => Self::UnsupportedModel(model),
            LocalError::OllamaUnavailable(msg) | LocalError::InferenceFailed(msg) => {
                Self::Provider(format!("Ollama: {msg}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_is_not_a_provider_fault() {
        let error: relay_core::Error = LocalError::ModelNotFound("mistral:7b".to_owned()).into();
        assert!(!error.is_provider_fault());
    }

    #[test]
    fn unreachable_daemon_is_a_provider_fault() {
        let error: relay_core::Error =
            LocalError::OllamaUnavailable("connection refused".to_owned()).into();
        assert!(error.is_provider_fault());
        assert!(error.to_string().contains("connection refused"));
    }
}
