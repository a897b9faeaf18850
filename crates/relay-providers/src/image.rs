//! Image generation through Hugging Face hosted diffusion models.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use relay_core::{Error, ImageGenerator, ImageModelInfo, ImageRequest, ImageResult, Result};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::env;
use std::time::Instant;

use crate::huggingface::{ENV_HUGGINGFACE_API_KEY, HUGGINGFACE_API_URL};

/// Model key used when a request names no model or an unknown one.
pub const DEFAULT_IMAGE_MODEL: &str = "stable-diffusion-xl";

/// Terms that mark a prompt as already asking for quality output.
const QUALITY_TERMS: [&str; 8] = [
    "high quality",
    "detailed",
    "sharp focus",
    "professional",
    "8k resolution",
    "masterpiece",
    "best quality",
    "ultra detailed",
];

/// Suffix appended to prompts that carry none of [`QUALITY_TERMS`].
const QUALITY_SUFFIX: &str =
    ", high quality, detailed, sharp focus, professional photography, 8k resolution, masterpiece";

const NEGATIVE_PROMPT: &str = "blurry, low quality, distorted, deformed, ugly, bad anatomy, \
    bad proportions, extra limbs, cloned face, disfigured, out of frame, malformed limbs, \
    missing arms, missing legs, mutated hands, poorly drawn hands, poorly drawn face";

/// One catalog entry: key, hub id, display name, description.
struct CatalogEntry {
    key: &'static str,
    hub_id: &'static str,
    display_name: &'static str,
    description: &'static str,
}

const CATALOG: [CatalogEntry; 5] = [
    CatalogEntry {
        key: "stable-diffusion-xl",
        hub_id: "stabilityai/stable-diffusion-xl-base-1.0",
        display_name: "Stable Diffusion XL",
        description: "High-quality, versatile image generation",
    },
    CatalogEntry {
        key: "stable-diffusion-2.1",
        hub_id: "stabilityai/stable-diffusion-2-1",
        display_name: "Stable Diffusion 2.1",
        description: "Lighter general-purpose diffusion model",
    },
    CatalogEntry {
        key: "flux-schnell",
        hub_id: "black-forest-labs/FLUX.1-schnell",
        display_name: "FLUX.1 Schnell",
        description: "Fast, high-quality image generation",
    },
    CatalogEntry {
        key: "playground-v2.5",
        hub_id: "playgroundai/playground-v2.5-1024px-aesthetic",
        display_name: "Playground v2.5",
        description: "Aesthetic, high-resolution images",
    },
    CatalogEntry {
        key: "realistic-vision",
        hub_id: "SG161222/Realistic_Vision_V6.0_B1_noVAE",
        display_name: "Realistic Vision",
        description: "Photorealistic image generation",
    },
];

#[derive(Debug, Serialize)]
struct DiffusionRequest {
    inputs: String,
    parameters: DiffusionParameters,
}

#[derive(Debug, Serialize)]
struct DiffusionParameters {
    width: u32,
    height: u32,
    num_inference_steps: u32,
    guidance_scale: f32,
    negative_prompt: &'static str,
}

/// Image pipeline backed by the Hugging Face Inference API.
pub struct HuggingFaceImageGenerator {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl HuggingFaceImageGenerator {
    /// Creates a generator with an optional access token. An empty token counts as absent.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::default(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: HUGGINGFACE_API_URL.to_owned(),
        }
    }

    /// Creates a generator from the `HUGGINGFACE_API_KEY` environment variable.
    pub fn from_env() -> Self {
        Self::new(env::var(ENV_HUGGINGFACE_API_KEY).ok())
    }

    /// Overrides the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_owned();
        self
    }

    /// Resolves a model key to `(key, hub id)`, falling back to SDXL.
    fn resolve_model(requested: Option<&str>) -> (&'static str, &'static str) {
        let entry = requested
            .and_then(|key| CATALOG.iter().find(|entry| entry.key == key))
            .unwrap_or(&CATALOG[0]);
        (entry.key, entry.hub_id)
    }

    /// Appends quality terms unless the prompt already asks for them.
    fn enhance_prompt(prompt: &str) -> String {
        let lower = prompt.to_lowercase();
        if QUALITY_TERMS.iter().any(|term| lower.contains(term)) {
            prompt.to_owned()
        } else {
            format!("{prompt}{QUALITY_SUFFIX}")
        }
    }

    fn to_data_url(bytes: &[u8]) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(bytes))
    }
}

#[async_trait]
impl ImageGenerator for HuggingFaceImageGenerator {
    fn name(&self) -> &str {
        "huggingface"
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn models(&self) -> Vec<ImageModelInfo> {
        if !self.is_available() {
            return Vec::new();
        }

        CATALOG
            .iter()
            .map(|entry| ImageModelInfo {
                name: entry.key.to_owned(),
                display_name: entry.display_name.to_owned(),
                description: entry.description.to_owned(),
                provider: self.name().to_owned(),
            })
            .collect()
    }

    async fn generate_image(&self, request: &ImageRequest) -> Result<ImageResult> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::MissingApiKey(ENV_HUGGINGFACE_API_KEY.to_owned()))?;

        let start = Instant::now();
        let (model_key, hub_id) = Self::resolve_model(request.model.as_deref());

        let payload = DiffusionRequest {
            inputs: Self::enhance_prompt(&request.prompt),
            parameters: DiffusionParameters {
                width: request.width,
                height: request.height,
                num_inference_steps: request.num_inference_steps,
                guidance_scale: request.guidance_scale,
                negative_prompt: NEGATIVE_PROMPT,
            },
        };

        tracing::debug!("Generating image with {hub_id}");

        let response = self
            .client
            .post(format!("{}/models/{hub_id}", self.base_url))
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|json| json.get("error").and_then(Value::as_str).map(str::to_owned))
                .unwrap_or(body);
            return Err(Error::from_status("Hugging Face image", status, &message));
        }

        let bytes = response.bytes().await?;

        Ok(ImageResult {
            images: vec![Self::to_data_url(&bytes)],
            model: model_key.to_owned(),
            provider: self.name().to_owned(),
            latency_ms: start.elapsed().as_millis() as u64,
            prompt: request.prompt.clone(),
        })
    }

    async fn health_check(&self) -> bool {
        let Some(api_key) = self.api_key.as_deref() else {
            return false;
        };

        let (_, hub_id) = Self::resolve_model(None);
        match self
            .client
            .get(format!("{}/models/{hub_id}", self.base_url))
            .header("Authorization", format!("Bearer {api_key}"))
            .send()
            .await
        {
            // 503 means the model is still loading.
            Ok(response) => matches!(
                response.status(),
                StatusCode::OK | StatusCode::SERVICE_UNAVAILABLE
            ),
            Err(_) => false,
        }
    }
}
