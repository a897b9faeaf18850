/// Per-provider availability flag.
pub mod breaker;
/// Provider registry with priority ranks and call timeouts.
pub mod registry;
/// Task label to candidate table and provider fallbacks.
pub mod table;

pub use breaker::{BreakerState, CircuitBreaker};
pub use registry::{
    DEFAULT_CALL_TIMEOUT, GROQ_RANK, HUGGINGFACE_RANK, HealthStatus, OLLAMA_RANK, ProviderHealth,
    ProviderRegistry, RegisteredProvider,
};
pub use table::{ProviderFallback, RoutingTable, TABLE_VERSION};
