//! Provider registry holding every backend with its priority, breaker and
//! call timeout.
//!
//! Providers are created once at startup and shared for the process
//! lifetime; only their breakers change afterwards.

use super::breaker::{BreakerState, CircuitBreaker};
use crate::config::RouterConfig;
use relay_core::{ModelInfo, ModelProvider};
use relay_local::OllamaProvider;
use relay_providers::{GroqProvider, HuggingFaceProvider};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Rank of the fastest remote backend.
pub const GROQ_RANK: u32 = 0;
/// Rank of the secondary remote backend.
pub const HUGGINGFACE_RANK: u32 = 1;
/// Rank of the local backend.
pub const OLLAMA_RANK: u32 = 2;

/// Timeout applied when a registration does not name one.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// A backend plus the routing state kept for it.
pub struct RegisteredProvider {
    provider: Arc<dyn ModelProvider>,
    rank: u32,
    timeout: Duration,
    breaker: CircuitBreaker,
}

impl RegisteredProvider {
    /// Provider name.
    pub fn name(&self) -> &str {
        self.provider.name()
    }

    /// The backend itself.
    pub fn provider(&self) -> &Arc<dyn ModelProvider> {
        &self.provider
    }

    /// Priority rank; lower is tried first.
    pub const fn rank(&self) -> u32 {
        self.rank
    }

    /// Per-call timeout.
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Current breaker state.
    pub fn breaker_state(&self) -> BreakerState {
        self.breaker.state()
    }

    /// Read before every attempt.
    pub fn is_available(&self) -> bool {
        self.breaker.is_closed()
    }

    /// Static membership check against the backend's model list.
    pub fn hosts_model(&self, model: &str) -> bool {
        self.provider.hosts_model(model)
    }

    /// First model in the static list.
    pub fn default_model(&self) -> Option<&str> {
        self.provider.models().first().map(String::as_str)
    }
}

/// Health check result for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// The backend answered its health check.
    Healthy,
    /// The health check failed.
    Unhealthy,
    /// The breaker is open; the backend was not contacted.
    Tripped,
}

/// Health report entry for one provider.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderHealth {
    /// Provider name.
    pub name: String,
    /// Outcome of the check.
    pub status: HealthStatus,
    /// Whether the backend runs locally.
    pub is_local: bool,
    /// Static model list.
    pub models: Vec<String>,
}

/// Registry of every backend, kept sorted by priority rank.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<RegisteredProvider>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the built-in backends enabled in `config`.
    ///
    /// A remote backend without an API key is still registered, with its
    /// breaker open, so it shows up in health reports but is never tried.
    pub fn from_config(config: &RouterConfig) -> Self {
        let mut registry = Self::new();
        let providers = &config.providers;

        if providers.groq.enabled {
            let mut groq = GroqProvider::new(config.get_api_key("groq"));
            if let Some(url) = &providers.groq.base_url {
                groq = groq.with_base_url(url.clone());
            }
            registry.register(Arc::new(groq), GROQ_RANK, providers.groq.timeout());
        }

        if providers.huggingface.enabled {
            let mut huggingface = HuggingFaceProvider::new(config.get_api_key("huggingface"));
            if let Some(url) = &providers.huggingface.base_url {
                huggingface = huggingface.with_base_url(url.clone());
            }
            registry.register(
                Arc::new(huggingface),
                HUGGINGFACE_RANK,
                providers.huggingface.timeout(),
            );
        }

        if providers.ollama.enabled {
            let ollama = OllamaProvider::new().with_url(providers.ollama.base_url.clone());
            registry.register(Arc::new(ollama), OLLAMA_RANK, providers.ollama.timeout());
        }

        registry
    }

    /// Register a provider at `rank`. Equal ranks keep registration order.
    ///
    /// Registering a name twice replaces the earlier entry.
    pub fn register(&mut self, provider: Arc<dyn ModelProvider>, rank: u32, timeout: Duration) {
        let breaker = if provider.is_configured() {
            CircuitBreaker::closed()
        } else {
            tracing::warn!(
                "Provider {} is missing credentials; it stays unavailable",
                provider.name()
            );
            CircuitBreaker::open()
        };

        self.providers.retain(|entry| entry.name() != provider.name());
        let position = self
            .providers
            .iter()
            .position(|entry| entry.rank > rank)
            .unwrap_or(self.providers.len());

        tracing::debug!("Registered provider {} at rank {rank}", provider.name());
        self.providers.insert(
            position,
            RegisteredProvider {
                provider,
                rank,
                timeout,
                breaker,
            },
        );
    }

    /// Builder form of [`ProviderRegistry::register`] with the default timeout.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn ModelProvider>, rank: u32) -> Self {
        self.register(provider, rank, DEFAULT_CALL_TIMEOUT);
        self
    }

    /// Builder form of [`ProviderRegistry::register`].
    #[must_use]
    pub fn with_provider_timeout(
        mut self,
        provider: Arc<dyn ModelProvider>,
        rank: u32,
        timeout: Duration,
    ) -> Self {
        self.register(provider, rank, timeout);
        self
    }

    /// All providers, highest priority first, regardless of availability.
    pub fn providers_by_priority(&self) -> impl Iterator<Item = &RegisteredProvider> {
        self.providers.iter()
    }

    /// Available providers, highest priority first.
    pub fn available_providers(&self) -> impl Iterator<Item = &RegisteredProvider> {
        self.providers.iter().filter(|entry| entry.is_available())
    }

    /// Looks up a provider by name.
    pub fn get(&self, name: &str) -> Option<&RegisteredProvider> {
        self.providers.iter().find(|entry| entry.name() == name)
    }

    /// Unknown providers are unavailable.
    pub fn is_available(&self, name: &str) -> bool {
        self.get(name).is_some_and(RegisteredProvider::is_available)
    }

    /// Whether the named provider claims `model`.
    pub fn hosts_model(&self, name: &str, model: &str) -> bool {
        self.get(name).is_some_and(|entry| entry.hosts_model(model))
    }

    /// Rank of the named provider.
    pub fn priority_rank(&self, name: &str) -> Option<u32> {
        self.get(name).map(RegisteredProvider::rank)
    }

    /// Providers claiming `model`, highest priority first.
    pub fn hosting(&self, model: &str) -> impl Iterator<Item = &RegisteredProvider> {
        self.providers
            .iter()
            .filter(move |entry| entry.hosts_model(model))
    }

    /// Models of available providers, in priority then list order.
    pub fn known_models(&self) -> Vec<ModelInfo> {
        self.available_providers()
            .flat_map(|entry| {
                let is_local = entry.provider.is_local();
                entry
                    .provider
                    .models()
                    .iter()
                    .map(move |model| ModelInfo::text(model, entry.name(), is_local))
            })
            .collect()
    }

    /// Opens the provider's breaker. Returns `true` if it was closed.
    pub fn mark_unavailable(&self, name: &str) -> bool {
        let tripped = self.get(name).is_some_and(|entry| entry.breaker.trip());
        if tripped {
            tracing::warn!("Provider {name} marked unavailable for the rest of this process");
        }
        tripped
    }

    /// Checks every provider with a closed breaker.
    pub async fn health(&self) -> Vec<ProviderHealth> {
        let mut report = Vec::with_capacity(self.providers.len());
        for entry in &self.providers {
            let status = if !entry.is_available() {
                HealthStatus::Tripped
            } else if entry.provider.health_check().await {
                HealthStatus::Healthy
            } else {
                HealthStatus::Unhealthy
            };

            report.push(ProviderHealth {
                name: entry.name().to_owned(),
                status,
                is_local: entry.provider.is_local(),
                models: entry.provider.models().to_vec(),
            });
        }
        report
    }
}
