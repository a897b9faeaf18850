use crate::models::{OllamaListResponse, OllamaModel};
use crate::{DEFAULT_OLLAMA_URL, LocalError, Result};
use reqwest::Client;

/// Checks a running Ollama daemon and lists its installed models.
#[derive(Clone)]
pub struct OllamaManager {
    /// HTTP client used to interact with the Ollama service.
    client: Client,
    /// Base URL pointing to the Ollama runtime.
    base_url: String,
}

impl OllamaManager {
    /// Creates a manager for the default local address.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_OLLAMA_URL.to_owned(),
        }
    }

    /// Points the manager at another daemon.
    #[must_use]
    pub fn with_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_owned();
        self
    }

    /// Address of the daemon, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if Ollama is running
    pub async fn is_available(&self) -> bool {
        match self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(error) => {
                tracing::debug!("Ollama health check failed: {error}");
                false
            }
        }
    }

    /// List installed models
    ///
    /// # Errors
    ///
    /// Returns an error if Ollama is not available or if the response cannot be parsed
    pub async fn list_models(&self) -> Result<Vec<OllamaModel>> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|err| LocalError::OllamaUnavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(LocalError::OllamaUnavailable(format!(
                "model listing returned {}",
                response.status()
            )));
        }

        let list: OllamaListResponse = response.json().await?;
        Ok(list.models)
    }

    /// Check if a specific model tag is installed
    ///
    /// # Errors
    ///
    /// Returns an error if the model list cannot be retrieved
    pub async fn has_model(&self, model_name: &str) -> Result<bool> {
        let models = self.list_models().await?;
        Ok(models.iter().any(|model| model.name == model_name))
    }
}

impl Default for OllamaManager {
    fn default() -> Self {
        Self::new()
    }
}
