use serde::{Deserialize, Serialize};

/// Ollama API response for model list
#[derive(Debug, Deserialize)]
pub struct OllamaListResponse {
    /// List of models installed in Ollama.
    #[serde(default)]
    pub models: Vec<OllamaModel>,
}

/// Information about an installed Ollama model.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaModel {
    /// Model tag, e.g. `llama3.1:8b`.
    pub name: String,
    /// Size of the model in bytes.
    #[serde(default)]
    pub size: u64,
    /// Last modification timestamp as reported by the daemon.
    #[serde(default)]
    pub modified_at: String,
}

/// Sampling options forwarded to the runtime.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OllamaOptions {
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens to generate.
    pub num_predict: u32,
}

/// Ollama API request for generation
#[derive(Debug, Serialize)]
pub struct OllamaGenerateRequest {
    /// Model to use for generation.
    pub model: String,
    /// Input prompt for the model.
    pub prompt: String,
    /// Whether to stream the response.
    pub stream: bool,
    /// Sampling options.
    pub options: OllamaOptions,
}

/// Ollama API response for generation
#[derive(Debug, Deserialize)]
pub struct OllamaGenerateResponse {
    /// Generated text content.
    #[serde(default)]
    pub response: String,
    /// Whether generation is complete.
    #[serde(default)]
    pub done: bool,
    /// Number of tokens generated.
    pub eval_count: Option<u64>,
}
