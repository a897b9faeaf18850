use core::fmt;
use relay_core::Error as CoreError;
use serde::Serialize;
use std::result::Result as StdResult;
use thiserror::Error;

/// Result type for routing operations.
pub type Result<T> = StdResult<T, RoutingError>;

/// One failed candidate attempt, kept for the terminal error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptFailure {
    /// Model that was asked for.
    pub model: String,
    /// Provider the attempt went to.
    pub provider: String,
    /// Rendered backend error.
    pub message: String,
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}: {}", self.model, self.provider, self.message)
    }
}

/// Errors surfaced by the routing engine.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// No registered provider claims the explicitly requested model.
    #[error("No provider hosts model {0}")]
    ModelNotHosted(String),

    /// A single candidate attempt failed.
    #[error("{model} on {provider} failed: {source}")]
    ProviderCallFailed {
        /// Model of the failed candidate.
        model: String,
        /// Provider of the failed candidate.
        provider: String,
        /// Backend error.
        source: CoreError,
    },

    /// Every candidate failed or none could be attempted.
    #[error("All providers exhausted after {} attempt(s){}", .0.len(), format_trail(.0))]
    AllProvidersExhausted(Vec<AttemptFailure>),

    /// Configuration or routing table could not be loaded.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The image pipeline could not serve an image request.
    #[error("Image generation failed: {0}")]
    ImageGeneration(String),
}

fn format_trail(attempts: &[AttemptFailure]) -> String {
    let mut trail = String::new();
    for attempt in attempts {
        trail.push_str("\n  - ");
        trail.push_str(&attempt.to_string());
    }
    trail
}

impl RoutingError {
    /// Attempt trail of a terminal failure; empty for every other variant.
    pub fn attempts(&self) -> &[AttemptFailure] {
        match self {
            Self::AllProvidersExhausted(attempts) => attempts,
            _ => &[],
        }
    }
}

impl From<RoutingError> for AttemptFailure {
    fn from(error: RoutingError) -> Self {
        match error {
            RoutingError::ProviderCallFailed {
                model,
                provider,
                source,
            } => Self {
                model,
                provider,
                message: source.to_string(),
            },
            other => Self {
                model: String::new(),
                provider: String::new(),
                message: other.to_string(),
            },
        }
    }
}
