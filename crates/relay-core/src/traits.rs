use async_trait::async_trait;

use crate::{Completion, GenerationOptions, ImageModelInfo, ImageRequest, ImageResult, Result};

/// A text generation backend (one per remote or local LLM service).
///
/// Implementations are constructed once at startup and shared for the
/// lifetime of the process.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Returns the unique identifier for this provider (e.g. `groq`).
    fn name(&self) -> &str;

    /// Whether the backend runs on the local machine.
    fn is_local(&self) -> bool;

    /// Static, ordered list of model identifiers this backend claims to serve.
    fn models(&self) -> &[String];

    /// Static membership check against [`ModelProvider::models`]; never touches the network.
    fn hosts_model(&self, model: &str) -> bool {
        self.models().iter().any(|hosted| hosted == model)
    }

    /// Whether the credentials and settings required to call the backend are present.
    fn is_configured(&self) -> bool;

    /// Generates a completion for `prompt` with the given model.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not served, the request fails,
    /// or the response cannot be parsed.
    async fn generate(
        &self,
        prompt: &str,
        model: &str,
        options: &GenerationOptions,
    ) -> Result<Completion>;

    /// Checks that the backend responds. Defaults to the configuration check.
    async fn health_check(&self) -> bool {
        self.is_configured()
    }
}

/// The image-generation collaborator entered on image intent.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Returns the provider name reported in results.
    fn name(&self) -> &str;

    /// Whether the pipeline has what it needs to run.
    fn is_available(&self) -> bool;

    /// Models the pipeline can be asked for.
    fn models(&self) -> Vec<ImageModelInfo>;

    /// Generates one or more images for the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline is not configured or the backend call fails.
    async fn generate_image(&self, request: &ImageRequest) -> Result<ImageResult>;

    /// Checks that the backend responds. Defaults to [`ImageGenerator::is_available`].
    async fn health_check(&self) -> bool {
        self.is_available()
    }
}
