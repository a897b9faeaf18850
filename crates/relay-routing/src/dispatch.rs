//! The dispatch executor: explicit model, classification, candidate cascade
//! and last-resort fallback.

use crate::classifier::IntentClassifier;
use crate::config::{ImageConfig, RouterConfig};
use crate::error::{AttemptFailure, Result, RoutingError};
use crate::router::{ProviderHealth, ProviderRegistry, RegisteredProvider, RoutingTable};
use crate::types::{Candidate, Classification, TaskLabel};
use relay_core::{
    Error as CoreError, GenerationOptions, GenerationRequest, GenerationResult, ImageGenerator,
    ImageRequest,
};
use relay_providers::HuggingFaceImageGenerator;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;

/// Image pipeline plus the parameters every handoff uses.
struct ImageHandoff {
    generator: Arc<dyn ImageGenerator>,
    settings: ImageConfig,
}

/// Candidate sequence a request would walk, computed without calling any backend.
#[derive(Debug, Clone, Serialize)]
pub struct RoutePlan {
    /// Available providers hosting the explicitly requested model.
    pub explicit: Vec<Candidate>,
    /// Outcome of classifying the prompt.
    pub classification: Classification,
    /// Auto-routing candidates; empty for image intent.
    pub candidates: Vec<Candidate>,
    /// Last-resort candidate, omitted when it repeats an earlier entry.
    pub last_resort: Option<Candidate>,
}

/// Failures and attempted pairs accumulated over one request.
#[derive(Default)]
struct AttemptTrail {
    failures: Vec<AttemptFailure>,
    attempted: HashSet<Candidate>,
}

impl AttemptTrail {
    fn record(&mut self, candidate: Candidate) -> bool {
        self.attempted.insert(candidate)
    }
}

/// Health of every backend and of the image pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// One entry per registered provider, in priority order.
    pub providers: Vec<ProviderHealth>,
    /// `None` when no image pipeline is attached.
    pub image: Option<bool>,
}

/// Routes generation requests across the registered providers.
pub struct Dispatcher {
    registry: Arc<ProviderRegistry>,
    table: Arc<RoutingTable>,
    classifier: IntentClassifier,
    defaults: GenerationOptions,
    image: Option<ImageHandoff>,
}

impl Dispatcher {
    /// Creates a dispatcher with default generation options and no image pipeline.
    pub fn new(registry: Arc<ProviderRegistry>, table: Arc<RoutingTable>) -> Self {
        Self {
            registry,
            table,
            classifier: IntentClassifier::new(),
            defaults: GenerationOptions::default(),
            image: None,
        }
    }

    /// Builds the registry, table and image pipeline described by `config`.
    ///
    /// # Errors
    /// Returns an error if the configured routing table cannot be loaded.
    pub fn from_config(config: &RouterConfig) -> Result<Self> {
        let table = match &config.routing_table {
            Some(path) => {
                tracing::info!("Loading routing table from {}", path.display());
                RoutingTable::load(path)?
            }
            None => RoutingTable::builtin(),
        };

        let mut dispatcher = Self::new(
            Arc::new(ProviderRegistry::from_config(config)),
            Arc::new(table),
        )
        .with_defaults(config.generation.options());

        if config.image.enabled {
            let mut generator = HuggingFaceImageGenerator::new(config.get_api_key("huggingface"));
            if let Some(url) = &config.providers.huggingface.base_url {
                generator = generator.with_base_url(url.clone());
            }
            dispatcher = dispatcher.with_image_generator(Arc::new(generator), config.image.clone());
        }

        Ok(dispatcher)
    }

    /// Defaults for requests that leave parameters unset.
    #[must_use]
    pub const fn with_defaults(mut self, defaults: GenerationOptions) -> Self {
        self.defaults = defaults;
        self
    }

    /// Attaches the pipeline used for image intent.
    #[must_use]
    pub fn with_image_generator(
        mut self,
        generator: Arc<dyn ImageGenerator>,
        settings: ImageConfig,
    ) -> Self {
        self.image = Some(ImageHandoff {
            generator,
            settings,
        });
        self
    }

    /// Registered providers and their breakers.
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// The routing table in use.
    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    /// The intent classifier.
    pub const fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    /// The attached image pipeline, if any.
    pub fn image_generator(&self) -> Option<&Arc<dyn ImageGenerator>> {
        self.image.as_ref().map(|handoff| &handoff.generator)
    }

    /// Routes one request.
    ///
    /// # Errors
    /// Returns [`RoutingError::AllProvidersExhausted`] with the attempt trail
    /// when no candidate succeeds, or [`RoutingError::ImageGeneration`] when an
    /// image request cannot be served.
    pub async fn route(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        self.dispatch(request, None).await
    }

    /// Routes a text request under a fixed task label, skipping intent
    /// classification and the image pipeline.
    ///
    /// # Errors
    /// Returns [`RoutingError::AllProvidersExhausted`] when no candidate succeeds.
    pub async fn route_task(
        &self,
        request: &GenerationRequest,
        label: TaskLabel,
    ) -> Result<GenerationResult> {
        self.dispatch(request, Some(label)).await
    }

    async fn dispatch(
        &self,
        request: &GenerationRequest,
        forced_label: Option<TaskLabel>,
    ) -> Result<GenerationResult> {
        let options = request.options(self.defaults);
        let mut trail = AttemptTrail::default();

        if let Some(model) = request.model.as_deref() {
            match self
                .route_explicit(model, &request.prompt, options, &mut trail)
                .await
            {
                Ok(result) => return Ok(result),
                Err(error) => {
                    tracing::info!("{error}; falling back to automatic routing");
                }
            }
        }

        let label = match forced_label {
            Some(label) => label,
            None => match self.classifier.classify(&request.prompt) {
                Classification::Image => {
                    tracing::info!("Image intent detected; handing off to the image pipeline");
                    return self.generate_image(&request.prompt).await;
                }
                Classification::Task(label) => label,
            },
        };
        tracing::info!("Routing prompt as {label}");

        for candidate in self.resolve_candidates(label) {
            if let Some(result) = self
                .try_candidate(&candidate, &request.prompt, options, &mut trail)
                .await
            {
                return Ok(result);
            }
        }

        if let Some(candidate) = self.last_resort() {
            if trail.attempted.contains(&candidate) {
                tracing::debug!("Last resort {candidate} already attempted");
            } else {
                tracing::info!("All routed candidates failed; trying last resort {candidate}");
                if let Some(result) = self
                    .try_candidate(&candidate, &request.prompt, options, &mut trail)
                    .await
                {
                    return Ok(result);
                }
            }
        }

        tracing::warn!(
            "All providers exhausted after {} attempt(s)",
            trail.failures.len()
        );
        Err(RoutingError::AllProvidersExhausted(trail.failures))
    }

    /// Resolves the candidates `route` would try for `request` in the current
    /// provider state, without calling any backend.
    pub fn plan(&self, request: &GenerationRequest) -> RoutePlan {
        let explicit: Vec<Candidate> = request
            .model
            .as_deref()
            .map(|model| {
                self.registry
                    .hosting(model)
                    .filter(|entry| entry.is_available())
                    .map(|entry| Candidate::new(model, entry.name()))
                    .collect()
            })
            .unwrap_or_default();

        let classification = self.classifier.classify(&request.prompt);
        let candidates = classification
            .label()
            .map(|label| self.resolve_candidates(label))
            .unwrap_or_default();

        // `route` skips a last resort that was already attempted.
        let last_resort = classification
            .label()
            .and_then(|_| self.last_resort())
            .filter(|candidate| !candidates.contains(candidate) && !explicit.contains(candidate));

        RoutePlan {
            explicit,
            classification,
            candidates,
            last_resort,
        }
    }

    /// Checks every provider and the image pipeline.
    pub async fn health(&self) -> HealthReport {
        let image = match &self.image {
            Some(handoff) => Some(handoff.generator.health_check().await),
            None => None,
        };

        HealthReport {
            providers: self.registry.health().await,
            image,
        }
    }

    /// Tries every available provider hosting `model`, highest priority first.
    async fn route_explicit(
        &self,
        model: &str,
        prompt: &str,
        options: GenerationOptions,
        trail: &mut AttemptTrail,
    ) -> Result<GenerationResult> {
        let hosting: Vec<&RegisteredProvider> = self.registry.hosting(model).collect();
        if hosting.is_empty() {
            return Err(RoutingError::ModelNotHosted(model.to_owned()));
        }

        let first_failure = trail.failures.len();
        for entry in hosting {
            let candidate = Candidate::new(model, entry.name());
            if let Some(result) = self.try_candidate(&candidate, prompt, options, trail).await {
                return Ok(result);
            }
        }

        Err(RoutingError::AllProvidersExhausted(
            trail.failures[first_failure..].to_vec(),
        ))
    }

    /// Routing-table candidates for `label`, restricted to available
    /// providers, with unhosted models substituted and duplicates removed.
    fn resolve_candidates(&self, label: TaskLabel) -> Vec<Candidate> {
        let mut resolved: Vec<Candidate> = Vec::new();

        for preferred in self.table.preferred_candidates(label) {
            let Some(entry) = self.registry.get(&preferred.provider) else {
                tracing::debug!("Skipping {preferred}: provider not registered");
                continue;
            };
            if !entry.is_available() {
                continue;
            }

            let model = if entry.hosts_model(&preferred.model) {
                preferred.model.clone()
            } else if let Some(substitute) = self.substitute_model(entry, label) {
                tracing::debug!(
                    "{} does not host {}; substituting {substitute}",
                    entry.name(),
                    preferred.model
                );
                substitute
            } else {
                continue;
            };

            let candidate = Candidate::new(model, entry.name());
            if !resolved.contains(&candidate) {
                resolved.push(candidate);
            }
        }

        resolved
    }

    /// The provider's own model for this task shape, or its first hosted model.
    fn substitute_model(&self, entry: &RegisteredProvider, label: TaskLabel) -> Option<String> {
        self.table
            .substitute_model(entry.name(), label)
            .filter(|model| entry.hosts_model(model))
            .or_else(|| entry.default_model())
            .map(str::to_owned)
    }

    /// Last-resort model of the highest-priority available provider.
    fn last_resort(&self) -> Option<Candidate> {
        let entry = self.registry.available_providers().next()?;
        let model = self
            .table
            .last_resort_model(entry.name())
            .filter(|model| entry.hosts_model(model))
            .or_else(|| entry.default_model())?;
        Some(Candidate::new(model, entry.name()))
    }

    /// One attempt. Failures are recorded in `trail`; provider faults open the
    /// provider's breaker. Unavailable and already-attempted candidates are
    /// skipped without a trail entry.
    async fn try_candidate(
        &self,
        candidate: &Candidate,
        prompt: &str,
        options: GenerationOptions,
        trail: &mut AttemptTrail,
    ) -> Option<GenerationResult> {
        let entry = self.registry.get(&candidate.provider)?;
        if !entry.is_available() {
            tracing::debug!("Skipping {candidate}: provider unavailable");
            return None;
        }
        if !trail.record(candidate.clone()) {
            tracing::debug!("Skipping {candidate}: already attempted");
            return None;
        }

        match self.attempt(entry, &candidate.model, prompt, options).await {
            Ok(result) => Some(result),
            Err(error) => {
                trail.failures.push(error.into());
                None
            }
        }
    }

    async fn attempt(
        &self,
        entry: &RegisteredProvider,
        model: &str,
        prompt: &str,
        options: GenerationOptions,
    ) -> Result<GenerationResult> {
        tracing::debug!("Trying {model} on {}", entry.name());
        let start = Instant::now();

        let outcome = match timeout(
            entry.timeout(),
            entry.provider().generate(prompt, model, &options),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_elapsed) => Err(CoreError::Timeout(entry.timeout().as_millis() as u64)),
        };

        match outcome {
            Ok(completion) => {
                let latency_ms = start.elapsed().as_millis() as u64;
                tracing::info!("Served by {model} on {} in {latency_ms}ms", entry.name());
                Ok(GenerationResult {
                    text: completion.text,
                    model: model.to_owned(),
                    provider: entry.name().to_owned(),
                    latency_ms,
                    tokens_used: completion.tokens_used,
                    images: Vec::new(),
                })
            }
            Err(error) => {
                tracing::warn!("{model} on {} failed: {error}", entry.name());
                if error.is_provider_fault() {
                    self.registry.mark_unavailable(entry.name());
                }
                Err(RoutingError::ProviderCallFailed {
                    model: model.to_owned(),
                    provider: entry.name().to_owned(),
                    source: error,
                })
            }
        }
    }

    async fn generate_image(&self, prompt: &str) -> Result<GenerationResult> {
        let handoff = self.image.as_ref().ok_or_else(|| {
            RoutingError::ImageGeneration("no image pipeline is configured".to_owned())
        })?;
        let generator = &handoff.generator;
        if !generator.is_available() {
            return Err(RoutingError::ImageGeneration(format!(
                "the {} image pipeline is missing credentials",
                generator.name()
            )));
        }

        let settings = &handoff.settings;
        let request = ImageRequest {
            prompt: prompt.to_owned(),
            model: Some(settings.model.clone()),
            width: settings.width,
            height: settings.height,
            num_images: 1,
            guidance_scale: settings.guidance_scale,
            num_inference_steps: settings.num_inference_steps,
        };

        let start = Instant::now();
        let image = timeout(settings.timeout(), generator.generate_image(&request))
            .await
            .map_err(|_elapsed| {
                RoutingError::ImageGeneration(format!(
                    "Timeout after {}ms",
                    settings.timeout().as_millis()
                ))
            })?
            .map_err(|error| RoutingError::ImageGeneration(error.to_string()))?;

        let Some(first) = image.images.first() else {
            return Err(RoutingError::ImageGeneration(
                "the image pipeline returned no images".to_owned(),
            ));
        };

        let latency_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "Image served by {} on {} in {latency_ms}ms",
            image.model,
            image.provider
        );

        Ok(GenerationResult {
            text: format!(
                "I've generated an image based on your prompt: \"{prompt}\"\n\n![Generated Image]({first})"
            ),
            model: image.model,
            provider: image.provider,
            latency_ms,
            tokens_used: None,
            images: image.images,
        })
    }
}
