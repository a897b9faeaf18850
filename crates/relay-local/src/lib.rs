//! Ollama-backed local inference provider.

/// Local backend error type.
pub mod error;
/// Text generation through the Ollama HTTP API.
pub mod inference;
/// Daemon health checks and model listing.
pub mod manager;
/// Ollama wire types.
pub mod models;

pub use error::{LocalError, Result};
pub use inference::OllamaProvider;
pub use manager::OllamaManager;
pub use models::{OllamaGenerateRequest, OllamaGenerateResponse, OllamaModel, OllamaOptions};

/// Default address of a locally running Ollama daemon.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
