use async_trait::async_trait;
use relay_core::{Completion, Error, GenerationOptions, ModelProvider, Result};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::env;

/// Hugging Face Inference API base URL.
pub const HUGGINGFACE_API_URL: &str = "https://api-inference.huggingface.co";
/// Env var key for the Hugging Face API token.
pub const ENV_HUGGINGFACE_API_KEY: &str = "HUGGINGFACE_API_KEY";
/// Registry name of this provider.
pub const PROVIDER_NAME: &str = "huggingface";
/// Text models served through the free inference tier.
pub const DEFAULT_MODELS: [&str; 2] = ["tiiuae/falcon-7b-instruct", "microsoft/Phi-3-mini"];

/// Hugging Face Inference API provider (free tier).
pub struct HuggingFaceProvider {
    /// HTTP client for API requests.
    client: Client,
    /// Access token, absent when not configured.
    api_key: Option<String>,
    /// API base URL.
    base_url: String,
    /// Models this provider claims to serve.
    models: Vec<String>,
}

/// Inference request body.
#[derive(Debug, Serialize)]
struct InferenceRequest {
    /// Prompt already wrapped in the model's chat template.
    inputs: String,
    /// Sampling parameters.
    parameters: InferenceParameters,
}

/// Sampling parameters understood by text-generation-inference.
#[derive(Debug, Serialize)]
struct InferenceParameters {
    max_new_tokens: u32,
    temperature: f32,
    do_sample: bool,
    return_full_text: bool,
}

impl HuggingFaceProvider {
    /// Creates a provider with an optional access token. An empty token counts as absent.
    pub fn new(api_key: Option<String>) -> Self {
        let api_key = api_key.filter(|key| !key.trim().is_empty());
        tracing::debug!(
            "HuggingFace API key loaded: {}",
            if api_key.is_some() { "yes" } else { "no" }
        );

        Self {
            client: Client::default(),
            api_key,
            base_url: HUGGINGFACE_API_URL.to_owned(),
            models: DEFAULT_MODELS.iter().map(|model| (*model).to_owned()).collect(),
        }
    }

    /// Creates a provider from the `HUGGINGFACE_API_KEY` environment variable.
    pub fn from_env() -> Self {
        Self::new(env::var(ENV_HUGGINGFACE_API_KEY).ok())
    }

    /// Overrides the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_owned();
        self
    }

    /// Wraps the prompt in the chat template the model was tuned on.
    fn format_prompt(model: &str, prompt: &str) -> String {
        let lower = model.to_lowercase();
        if lower.contains("phi") {
            format!("<|user|>\n{prompt}<|end|>\n<|assistant|>\n")
        } else if lower.contains("falcon") {
            format!("User: {prompt}\nAssistant:")
        } else {
            prompt.to_owned()
        }
    }

    /// Pulls generated text out of the inference response, dropping an echoed prompt.
    fn extract_text(body: &Value, formatted_prompt: &str) -> Result<String> {
        let generated = match body {
            Value::Array(items) => items
                .first()
                .and_then(|item| item.get("generated_text"))
                .and_then(Value::as_str),
            Value::Object(_) => body.get("generated_text").and_then(Value::as_str),
            _ => None,
        }
        .ok_or_else(|| {
            Error::InvalidResponse(format!("Unexpected Hugging Face response: {body}"))
        })?;

        Ok(generated.replace(formatted_prompt, "").trim().to_owned())
    }
}

#[async_trait]
impl ModelProvider for HuggingFaceProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn is_local(&self) -> bool {
        false
    }

    fn models(&self) -> &[String] {
        &self.models
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(
        &self,
        prompt: &str,
        model: &str,
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::MissingApiKey(ENV_HUGGINGFACE_API_KEY.to_owned()))?;

        if !self.hosts_model(model) {
            return Err(Error::UnsupportedModel(format!(
                "Model {model} not available in Hugging Face"
            )));
        }

        let formatted_prompt = Self::format_prompt(model, prompt);
        let request = InferenceRequest {
            inputs: formatted_prompt.clone(),
            parameters: InferenceParameters {
                max_new_tokens: options.max_tokens,
                temperature: options.temperature,
                do_sample: true,
                return_full_text: false,
            },
        };

        let response = self
            .client
            .post(format!("{}/models/{model}", self.base_url))
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await.map_err(|err| {
            Error::InvalidResponse(format!("Failed to parse Hugging Face response: {err}"))
        })?;

        if !status.is_success() {
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error");
            return Err(Error::from_status("Hugging Face", status, message));
        }

        // The inference API does not report token counts.
        Ok(Completion {
            text: Self::extract_text(&body, &formatted_prompt)?,
            tokens_used: None,
        })
    }
}
