//! Mock providers for testing routing behaviour.
//!
//! Allows defining canned responses and scripted failures per model, enabling
//! end-to-end testing of the dispatch cascade without real API calls.

use async_trait::async_trait;
use relay_core::{
    Completion, Error, GenerationOptions, IgnoreLock as _, IgnoreRwLock as _, ImageGenerator,
    ImageModelInfo, ImageRequest, ImageResult, ModelProvider, Result,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tokio::time::sleep;
use std::time::Duration;

/// Kind of failure a mock provider should simulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// Connection-level failure (provider fault).
    Unreachable,
    /// Credentials rejected (provider fault).
    Authentication,
    /// Per-model rate limit hit (model-specific fault).
    RateLimited,
    /// The model was refused (model-specific fault).
    UnsupportedModel,
    /// The request was rejected with a 400/422 (model-specific fault).
    Rejected,
}

impl MockFailure {
    fn to_error(self, provider: &str, model: &str) -> Error {
        match self {
            Self::Unreachable => Error::Provider(format!("{provider} unreachable")),
            Self::Authentication => Error::Authentication(format!("{provider} rejected the key")),
            Self::RateLimited => {
                Error::RateLimited(format!("{provider} rate limit exceeded for {model}"))
            }
            Self::Rejected => {
                Error::RejectedRequest(format!("{provider} rejected {model} request"))
            }
            Self::UnsupportedModel => {
                Error::UnsupportedModel(format!("{model} refused by {provider}"))
            }
        }
    }
}

/// A recorded call against a mock provider.
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    /// Model the call asked for.
    pub model: String,
    /// Prompt text.
    pub prompt: String,
    /// Resolved generation parameters.
    pub options: GenerationOptions,
}

/// Mock provider that returns pre-defined responses based on prompt patterns.
#[derive(Clone)]
pub struct MockProvider {
    /// Registry name of this mock provider
    name: String,
    /// Models this mock claims to host
    models: Vec<String>,
    /// Whether it reports itself as local
    local: bool,
    /// Whether it reports credentials as present
    configured: bool,
    /// Predefined responses keyed by prompt substring
    responses: Arc<Mutex<Vec<(String, String)>>>,
    /// Default response if no pattern matches
    default_response: Arc<Mutex<Option<String>>>,
    /// Failures keyed by model, `None` key applies to every model
    failures: Arc<RwLock<HashMap<Option<String>, MockFailure>>>,
    /// Artificial latency before answering
    delay: Option<Duration>,
    /// Call history for verification
    call_history: Arc<Mutex<Vec<MockCall>>>,
}

impl MockProvider {
    /// Create a new remote mock provider hosting the given models.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            models: models.into_iter().map(Into::into).collect(),
            local: false,
            configured: true,
            responses: Arc::new(Mutex::new(Vec::new())),
            default_response: Arc::new(Mutex::new(None)),
            failures: Arc::new(RwLock::new(HashMap::new())),
            delay: None,
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Mark the mock as a local backend.
    #[must_use]
    pub fn local(mut self) -> Self {
        self.local = true;
        self
    }

    /// Report missing credentials.
    #[must_use]
    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    /// Add a pattern-based response to the mock provider.
    #[must_use]
    pub fn with_response(self, pattern: impl Into<String>, response: impl Into<String>) -> Self {
        self.responses
            .lock_ignore_poison()
            .push((pattern.into(), response.into()));
        self
    }

    /// Set a default response for prompts that don't match any pattern.
    #[must_use]
    pub fn with_default_response(self, response: impl Into<String>) -> Self {
        *self.default_response.lock_ignore_poison() = Some(response.into());
        self
    }

    /// Fail every call with the given failure.
    #[must_use]
    pub fn failing(self, failure: MockFailure) -> Self {
        self.failures.write_ignore_poison().insert(None, failure);
        self
    }

    /// Fail calls for one model with the given failure.
    #[must_use]
    pub fn failing_model(self, model: impl Into<String>, failure: MockFailure) -> Self {
        self.failures
            .write_ignore_poison()
            .insert(Some(model.into()), failure);
        self
    }

    /// Sleep before answering each call.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Stop failing; subsequent calls succeed.
    pub fn recover(&self) {
        self.failures.write_ignore_poison().clear();
    }

    /// Clear the call history.
    pub fn clear_history(&self) {
        self.call_history.lock_ignore_poison().clear();
    }

    /// Get the call history.
    #[must_use]
    pub fn get_call_history(&self) -> Vec<MockCall> {
        self.call_history.lock_ignore_poison().clone()
    }

    /// Models requested so far, in call order.
    #[must_use]
    pub fn called_models(&self) -> Vec<String> {
        self.call_history
            .lock_ignore_poison()
            .iter()
            .map(|call| call.model.clone())
            .collect()
    }

    /// Get the number of calls made.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.call_history.lock_ignore_poison().len()
    }

    fn scripted_failure(&self, model: &str) -> Option<MockFailure> {
        let failures = self.failures.read_ignore_poison();
        failures
            .get(&Some(model.to_owned()))
            .or_else(|| failures.get(&None))
            .copied()
    }

    fn find_response(&self, prompt: &str) -> Option<String> {
        self.responses
            .lock_ignore_poison()
            .iter()
            .find(|(pattern, _)| prompt.contains(pattern.as_str()))
            .map(|(_, response)| response.clone())
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_local(&self) -> bool {
        self.local
    }

    fn models(&self) -> &[String] {
        &self.models
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn generate(
        &self,
        prompt: &str,
        model: &str,
        options: &GenerationOptions,
    ) -> Result<Completion> {
        self.call_history.lock_ignore_poison().push(MockCall {
            model: model.to_owned(),
            prompt: prompt.to_owned(),
            options: *options,
        });

        if let Some(delay) = self.delay {
            sleep(delay).await;
        }

        if let Some(failure) = self.scripted_failure(model) {
            return Err(failure.to_error(&self.name, model));
        }

        if !self.hosts_model(model) {
            return Err(MockFailure::UnsupportedModel.to_error(&self.name, model));
        }

        let text = self.find_response(prompt).unwrap_or_else(|| {
            self.default_response
                .lock_ignore_poison()
                .clone()
                .unwrap_or_else(|| format!("{}/{model}: {prompt}", self.name))
        });

        Ok(Completion {
            text,
            tokens_used: Some(prompt.split_whitespace().count() as u64),
        })
    }
}

/// Mock image pipeline returning a fixed one-pixel payload.
#[derive(Clone)]
pub struct MockImageGenerator {
    available: bool,
    fail: bool,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockImageGenerator {
    /// Payload returned for every generated image.
    pub const IMAGE: &'static str = "data:image/png;base64,iVBORw0KGgo=";

    /// Create an available pipeline that succeeds on every call.
    #[must_use]
    pub fn new() -> Self {
        Self {
            available: true,
            fail: false,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Report the pipeline as unconfigured.
    #[must_use]
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Fail every generation.
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Prompts received so far.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock_ignore_poison().clone()
    }
}

impl Default for MockImageGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageGenerator for MockImageGenerator {
    fn name(&self) -> &str {
        "mock-image"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn models(&self) -> Vec<ImageModelInfo> {
        vec![ImageModelInfo {
            name: "mock-diffusion".to_owned(),
            display_name: "Mock Diffusion".to_owned(),
            description: "Returns a fixed image".to_owned(),
            provider: self.name().to_owned(),
        }]
    }

    async fn generate_image(&self, request: &ImageRequest) -> Result<ImageResult> {
        self.prompts.lock_ignore_poison().push(request.prompt.clone());

        if self.fail {
            return Err(Error::Provider("mock image backend failed".to_owned()));
        }

        Ok(ImageResult {
            images: vec![Self::IMAGE.to_owned()],
            model: request
                .model
                .clone()
                .unwrap_or_else(|| "mock-diffusion".to_owned()),
            provider: self.name().to_owned(),
            latency_ms: 0,
            prompt: request.prompt.clone(),
        })
    }
}
