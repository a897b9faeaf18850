use serde::{Deserialize, Serialize};

/// Output length used when a request does not specify one.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
/// Sampling temperature used when a request does not specify one.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// A free-text generation request.
///
/// When `model` is `None` the dispatcher picks one by classifying the prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The user prompt.
    pub prompt: String,
    /// Explicit model to use, skipping classification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Output length limit; the configured default applies when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature; the configured default applies when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl GenerationRequest {
    /// Creates a request with no explicit model or parameters.
    pub fn new<T: Into<String>>(prompt: T) -> Self {
        Self {
            prompt: prompt.into(),
            model: None,
            max_tokens: None,
            temperature: None,
        }
    }

    /// Pins the request to `model`.
    #[must_use]
    pub fn with_model<T: Into<String>>(mut self, model: T) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the output length limit.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Resolves the optional parameters against `defaults`.
    #[must_use]
    pub fn options(&self, defaults: GenerationOptions) -> GenerationOptions {
        GenerationOptions {
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: self.temperature.unwrap_or(defaults.temperature),
        }
    }
}

/// Fully resolved generation parameters handed to a backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Output length limit in tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Raw output of a single backend call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    /// Generated text.
    pub text: String,
    /// Token usage, when the backend reports it.
    pub tokens_used: Option<u64>,
}

/// The caller-facing result of a routed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Generated text, or a short notice for image responses.
    pub text: String,
    /// Model that actually served the request.
    pub model: String,
    /// Provider that actually served the request.
    pub provider: String,
    /// Wall-clock time of the successful attempt.
    pub latency_ms: u64,
    /// Token usage, when the backend reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
    /// Data URLs of generated images, empty for text responses.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

/// Whether a model produces text or images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Produces text completions.
    #[default]
    Text,
    /// Produces images.
    Image,
}

/// Listing entry for a model served by a registered provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier as the provider expects it.
    pub name: String,
    /// Name of the hosting provider.
    pub provider: String,
    /// Estimated context window.
    pub max_tokens: u32,
    /// Whether the hosting provider runs locally.
    pub is_local: bool,
    /// Whether the hosting provider is currently marked available.
    pub is_available: bool,
    /// Text or image model.
    pub kind: ModelKind,
}

impl ModelInfo {
    /// Builds a text model entry, estimating the window from the model name.
    pub fn text(name: &str, provider: &str, is_local: bool) -> Self {
        Self {
            name: name.to_owned(),
            provider: provider.to_owned(),
            max_tokens: Self::estimate_max_tokens(name),
            is_local,
            is_available: true,
            kind: ModelKind::Text,
        }
    }

    /// Rough context window guess based on the parameter count in the name.
    #[must_use]
    pub fn estimate_max_tokens(name: &str) -> u32 {
        let lower = name.to_lowercase();
        if lower.contains("70b") {
            32_000
        } else if lower.contains("9b") {
            8192
        } else if lower.contains("7b") {
            4096
        } else if lower.contains("8192") {
            8192
        } else {
            8000
        }
    }
}

/// Request handed to the image pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRequest {
    /// Image description.
    pub prompt: String,
    /// Image model; the pipeline default applies when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Number of images to generate.
    pub num_images: u32,
    /// Classifier-free guidance strength.
    pub guidance_scale: f32,
    /// Diffusion step count.
    pub num_inference_steps: u32,
}

impl ImageRequest {
    /// Creates a 1024x1024 single-image request.
    pub fn new<T: Into<String>>(prompt: T) -> Self {
        Self {
            prompt: prompt.into(),
            model: None,
            width: 1024,
            height: 1024,
            num_images: 1,
            guidance_scale: 7.5,
            num_inference_steps: 50,
        }
    }

    /// Selects the image model.
    #[must_use]
    pub fn with_model<T: Into<String>>(mut self, model: T) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Output of the image pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResult {
    /// Generated images as `data:` URLs.
    pub images: Vec<String>,
    /// Model that produced the images.
    pub model: String,
    /// Pipeline name.
    pub provider: String,
    /// Wall-clock time of the pipeline call.
    pub latency_ms: u64,
    /// Prompt the images were generated from.
    pub prompt: String,
}

/// Listing entry for an image model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageModelInfo {
    /// Model identifier.
    pub name: String,
    /// Human-readable name.
    pub display_name: String,
    /// One-line description.
    pub description: String,
    /// Pipeline name.
    pub provider: String,
}
