//! Routing and dispatch engine.
//!
//! A prompt is classified into image intent or a [`TaskLabel`], the
//! [`RoutingTable`] turns the label into an ordered list of candidates, and
//! the [`Dispatcher`] walks those candidates against the [`ProviderRegistry`]
//! until one succeeds. Providers that fail with a provider-level error are
//! skipped by every later request.

/// Intent classification.
pub mod classifier;
/// Router configuration loading and persistence.
pub mod config;
/// The dispatch executor.
pub mod dispatch;
/// Routing error taxonomy.
pub mod error;
/// Provider registry, breakers and the routing table.
pub mod router;
/// Conversation title generation.
pub mod titles;
/// Task labels, classifications and candidates.
pub mod types;

pub use classifier::{CategoryScore, ClassificationReport, IntentClassifier, RuleKind, RuleOutcome};
pub use config::{
    GenerationConfig, ImageConfig, LocalProviderConfig, ProvidersConfig, RemoteProviderConfig,
    RouterConfig,
};
pub use dispatch::{Dispatcher, HealthReport, RoutePlan};
pub use error::{AttemptFailure, Result, RoutingError};
pub use router::{
    BreakerState, CircuitBreaker, HealthStatus, ProviderHealth, ProviderRegistry,
    RegisteredProvider, RoutingTable,
};
pub use titles::{ChatMessage, TitleGenerator, TitleResult};
pub use types::{Candidate, Classification, TaskLabel};
