use async_trait::async_trait;
use relay_core::{Completion, GenerationOptions, ModelProvider, Result};
use reqwest::{Client, StatusCode};

use crate::models::{OllamaGenerateRequest, OllamaGenerateResponse, OllamaOptions};
use crate::{LocalError, OllamaManager, Result as LocalResult};

/// Registry name of this provider.
pub const PROVIDER_NAME: &str = "ollama";

/// Commonly pulled models; the daemon must already have them installed.
pub const DEFAULT_MODELS: [&str; 5] = [
    "llama3.1:8b",
    "llama3:8b",
    "mistral:7b",
    "gemma2:9b",
    "codellama:7b",
];

/// Local model provider using Ollama
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    models: Vec<String>,
    manager: OllamaManager,
}

impl OllamaProvider {
    /// Creates a provider for the default local daemon and model list.
    #[must_use]
    pub fn new() -> Self {
        let manager = OllamaManager::new();
        Self {
            client: Client::new(),
            base_url: manager.base_url().to_owned(),
            models: DEFAULT_MODELS.iter().map(|model| (*model).to_owned()).collect(),
            manager,
        }
    }

    /// Points the provider at another daemon.
    #[must_use]
    pub fn with_url(mut self, url: String) -> Self {
        self.manager = self.manager.with_url(url);
        self.base_url = self.manager.base_url().to_owned();
        self
    }

    /// Replaces the static model list.
    #[must_use]
    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = models;
        self
    }

    /// Health and listing client for the same daemon.
    pub fn manager(&self) -> &OllamaManager {
        &self.manager
    }

    async fn generate_completion(
        &self,
        prompt: &str,
        model: &str,
        options: &GenerationOptions,
    ) -> LocalResult<OllamaGenerateResponse> {
        let request = OllamaGenerateRequest {
            model: model.to_owned(),
            prompt: prompt.to_owned(),
            stream: false,
            options: OllamaOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|err| LocalError::OllamaUnavailable(err.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(LocalError::ModelNotFound(format!(
                "{model} is not pulled on this Ollama instance"
            )));
        }
        if !status.is_success() {
            return Err(LocalError::InferenceFailed(format!(
                "Ollama returned error: {status}"
            )));
        }

        Ok(response.json().await?)
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelProvider for OllamaProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn is_local(&self) -> bool {
        true
    }

    fn models(&self) -> &[String] {
        &self.models
    }

    /// Ollama needs no credentials.
    fn is_configured(&self) -> bool {
        true
    }

    async fn generate(
        &self,
        prompt: &str,
        model: &str,
        options: &GenerationOptions,
    ) -> Result<Completion> {
        if !self.hosts_model(model) {
            return Err(
                LocalError::ModelNotFound(format!("Model {model} not available in Ollama")).into(),
            );
        }

        let response = self.generate_completion(prompt, model, options).await?;

        Ok(Completion {
            text: response.response,
            tokens_used: response.eval_count,
        })
    }

    async fn health_check(&self) -> bool {
        self.manager.is_available().await
    }
}
