//! End-to-end dispatch tests against scripted providers.

#![cfg(test)]
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    reason = "Test code is allowed to use expect/unwrap and doesn't need panic docs"
)]

use relay_core::{GenerationOptions, GenerationRequest};
use relay_providers::{MockFailure, MockImageGenerator, MockProvider};
use relay_routing::router::{GROQ_RANK, HUGGINGFACE_RANK, OLLAMA_RANK};
use relay_routing::{
    Candidate, ChatMessage, Classification, Dispatcher, ImageConfig, ProviderRegistry,
    RoutingError, RoutingTable, TaskLabel, TitleGenerator,
};
use std::sync::Arc;
use std::time::Duration;

const SKY_PROMPT: &str = "Can you explain why the sky is blue?";

fn groq() -> MockProvider {
    MockProvider::new(
        "groq",
        [
            "llama-3.1-8b-instant",
            "llama3-8b-8192",
            "gemma2-9b-it",
            "gemma-7b-it",
        ],
    )
}

fn huggingface() -> MockProvider {
    MockProvider::new(
        "huggingface",
        ["tiiuae/falcon-7b-instruct", "microsoft/Phi-3-mini"],
    )
}

fn ollama() -> MockProvider {
    MockProvider::new(
        "ollama",
        [
            "llama3.1:8b",
            "llama3:8b",
            "mistral:7b",
            "gemma2:9b",
            "codellama:7b",
        ],
    )
    .local()
}

/// Mocks shared with the dispatcher so tests can inspect their call history.
struct Fixture {
    groq: MockProvider,
    huggingface: MockProvider,
    ollama: MockProvider,
}

impl Fixture {
    fn new() -> Self {
        Self::with(groq(), huggingface(), ollama())
    }

    fn with(groq: MockProvider, huggingface: MockProvider, ollama: MockProvider) -> Self {
        Self {
            groq,
            huggingface,
            ollama,
        }
    }

    fn registry(&self) -> ProviderRegistry {
        ProviderRegistry::new()
            .with_provider(Arc::new(self.groq.clone()), GROQ_RANK)
            .with_provider(Arc::new(self.huggingface.clone()), HUGGINGFACE_RANK)
            .with_provider(Arc::new(self.ollama.clone()), OLLAMA_RANK)
    }

    fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(Arc::new(self.registry()), Arc::new(RoutingTable::builtin()))
    }
}

#[tokio::test]
async fn sky_prompt_uses_top_reasoning_candidate() {
    let fixture = Fixture::new();
    let dispatcher = fixture.dispatcher();

    let result = dispatcher
        .route(&GenerationRequest::new(SKY_PROMPT))
        .await
        .expect("route should succeed");

    assert_eq!(result.model, "gemma2-9b-it");
    assert_eq!(result.provider, "groq");
    assert!(result.images.is_empty());
    assert_eq!(fixture.groq.call_count(), 1);
}

#[tokio::test]
async fn sky_prompt_skips_unavailable_top_provider() {
    let fixture = Fixture::new();
    let dispatcher = fixture.dispatcher();
    dispatcher.registry().mark_unavailable("groq");

    let result = dispatcher
        .route(&GenerationRequest::new(SKY_PROMPT))
        .await
        .expect("route should succeed");

    assert_eq!(result.provider, "huggingface");
    assert_eq!(result.model, "microsoft/Phi-3-mini");
    assert_eq!(fixture.groq.call_count(), 0);
}

#[tokio::test]
async fn model_fault_advances_to_next_candidate_without_tripping() {
    let fixture = Fixture::with(
        groq().failing_model("gemma2-9b-it", MockFailure::UnsupportedModel),
        huggingface(),
        ollama(),
    );
    let dispatcher = fixture.dispatcher();

    let result = dispatcher
        .route(&GenerationRequest::new(SKY_PROMPT))
        .await
        .expect("route should succeed");

    assert_eq!(result.model, "llama-3.1-8b-instant");
    assert_eq!(result.provider, "groq");
    assert!(dispatcher.registry().is_available("groq"));
    assert_eq!(
        fixture.groq.called_models(),
        vec!["gemma2-9b-it", "llama-3.1-8b-instant"]
    );
}

#[tokio::test]
async fn rate_limited_model_keeps_provider_available() {
    let fixture = Fixture::with(
        groq().failing_model("gemma2-9b-it", MockFailure::RateLimited),
        huggingface(),
        ollama(),
    );
    let dispatcher = fixture.dispatcher();

    let result = dispatcher
        .route(&GenerationRequest::new(SKY_PROMPT))
        .await
        .expect("route should succeed");

    assert_eq!(result.model, "llama-3.1-8b-instant");
    assert_eq!(result.provider, "groq");
    assert!(dispatcher.registry().is_available("groq"));
    assert_eq!(
        fixture.groq.called_models(),
        vec!["gemma2-9b-it", "llama-3.1-8b-instant"]
    );
}

#[tokio::test]
async fn rejected_request_keeps_provider_available() {
    let fixture = Fixture::with(
        groq().failing_model("gemma2-9b-it", MockFailure::Rejected),
        huggingface(),
        ollama(),
    );
    let dispatcher = fixture.dispatcher();

    let result = dispatcher
        .route(&GenerationRequest::new(SKY_PROMPT))
        .await
        .expect("route should succeed");

    assert_eq!(result.model, "llama-3.1-8b-instant");
    assert_eq!(result.provider, "groq");
    assert!(dispatcher.registry().is_available("groq"));
    assert_eq!(fixture.huggingface.call_count(), 0);
}

#[tokio::test]
async fn provider_fault_trips_breaker_for_later_requests() {
    let fixture = Fixture::with(
        groq().failing(MockFailure::Authentication),
        huggingface(),
        ollama(),
    );
    let dispatcher = fixture.dispatcher();

    let first = dispatcher
        .route(&GenerationRequest::new(SKY_PROMPT))
        .await
        .expect("route should succeed");
    assert_eq!(first.provider, "huggingface");
    assert!(!dispatcher.registry().is_available("groq"));

    // The provider recovering does not close the breaker.
    fixture.groq.recover();
    let second = dispatcher
        .route(&GenerationRequest::new(SKY_PROMPT))
        .await
        .expect("route should succeed");
    assert_eq!(second.provider, "huggingface");
    assert_eq!(fixture.groq.call_count(), 1);
}

#[tokio::test]
async fn explicit_model_bypasses_routing_table() {
    let fixture = Fixture::new();
    let dispatcher = fixture.dispatcher();

    let request = GenerationRequest::new(SKY_PROMPT).with_model("codellama:7b");
    let result = dispatcher.route(&request).await.expect("route should succeed");

    assert_eq!(result.model, "codellama:7b");
    assert_eq!(result.provider, "ollama");
    assert_eq!(fixture.groq.call_count(), 0);
}

/// Registry with a second provider that also serves `gemma2-9b-it`.
fn mirrored(groq: &MockProvider, mirror: &MockProvider) -> Dispatcher {
    let registry = ProviderRegistry::new()
        .with_provider(Arc::new(groq.clone()), GROQ_RANK)
        .with_provider(Arc::new(mirror.clone()), HUGGINGFACE_RANK)
        .with_provider(Arc::new(ollama()), OLLAMA_RANK);
    Dispatcher::new(Arc::new(registry), Arc::new(RoutingTable::builtin()))
}

#[tokio::test]
async fn explicit_model_fault_moves_to_next_host_without_tripping() {
    let primary = groq().failing_model("gemma2-9b-it", MockFailure::UnsupportedModel);
    let mirror = MockProvider::new("mirror", ["gemma2-9b-it"]);
    let dispatcher = mirrored(&primary, &mirror);

    let request = GenerationRequest::new(SKY_PROMPT).with_model("gemma2-9b-it");
    let result = dispatcher.route(&request).await.expect("route should succeed");

    assert_eq!(result.model, "gemma2-9b-it");
    assert_eq!(result.provider, "mirror");
    assert!(dispatcher.registry().is_available("groq"));
    assert_eq!(primary.called_models(), vec!["gemma2-9b-it"]);
}

#[tokio::test]
async fn explicit_provider_fault_moves_to_next_host_and_trips() {
    let primary = groq().failing(MockFailure::Unreachable);
    let mirror = MockProvider::new("mirror", ["gemma2-9b-it"]);
    let dispatcher = mirrored(&primary, &mirror);

    let request = GenerationRequest::new(SKY_PROMPT).with_model("gemma2-9b-it");
    let result = dispatcher.route(&request).await.expect("route should succeed");

    assert_eq!(result.provider, "mirror");
    assert!(!dispatcher.registry().is_available("groq"));
    assert_eq!(primary.call_count(), 1);
    assert_eq!(mirror.called_models(), vec!["gemma2-9b-it"]);
}

#[tokio::test]
async fn unhosted_explicit_model_falls_through_to_auto_routing() {
    let fixture = Fixture::new();
    let dispatcher = fixture.dispatcher();

    let request = GenerationRequest::new(SKY_PROMPT).with_model("gpt-4");
    let result = dispatcher.route(&request).await.expect("route should succeed");

    assert_eq!(result.model, "gemma2-9b-it");
    assert_eq!(result.provider, "groq");
}

#[tokio::test]
async fn failed_explicit_model_falls_through_to_auto_routing() {
    let fixture = Fixture::with(groq().failing(MockFailure::Unreachable), huggingface(), ollama());
    let dispatcher = fixture.dispatcher();

    let request = GenerationRequest::new("hello there").with_model("gemma-7b-it");
    let result = dispatcher.route(&request).await.expect("route should succeed");

    assert_eq!(result.model, "llama3.1:8b");
    assert_eq!(result.provider, "ollama");
    assert_eq!(fixture.groq.called_models(), vec!["gemma-7b-it"]);
}

#[tokio::test]
async fn no_available_provider_gives_empty_trail() {
    let fixture = Fixture::new();
    let dispatcher = fixture.dispatcher();
    for name in ["groq", "huggingface", "ollama"] {
        dispatcher.registry().mark_unavailable(name);
    }

    let error = dispatcher
        .route(&GenerationRequest::new(SKY_PROMPT))
        .await
        .expect_err("route should fail");

    assert!(matches!(error, RoutingError::AllProvidersExhausted(_)));
    assert!(error.attempts().is_empty());
    assert_eq!(
        fixture.groq.call_count() + fixture.huggingface.call_count() + fixture.ollama.call_count(),
        0
    );
}

#[tokio::test]
async fn every_failure_is_listed_in_the_trail() {
    let fixture = Fixture::with(
        groq().failing(MockFailure::Unreachable),
        huggingface().failing(MockFailure::RateLimited),
        ollama().failing(MockFailure::Unreachable),
    );
    let dispatcher = fixture.dispatcher();

    let error = dispatcher
        .route(&GenerationRequest::new("hello there"))
        .await
        .expect_err("route should fail");

    let attempted: Vec<Candidate> = error
        .attempts()
        .iter()
        .map(|attempt| Candidate::new(attempt.model.clone(), attempt.provider.clone()))
        .collect();
    // The second groq candidate is skipped once groq trips; huggingface is
    // only reached as the last resort, and its rate limit does not trip it.
    assert_eq!(
        attempted,
        vec![
            Candidate::new("llama-3.1-8b-instant", "groq"),
            Candidate::new("llama3.1:8b", "ollama"),
            Candidate::new("microsoft/Phi-3-mini", "huggingface"),
        ]
    );
    assert!(error.attempts()[2].message.contains("Rate limited"));
    assert!(dispatcher.registry().is_available("huggingface"));
}

#[tokio::test]
async fn last_resort_uses_highest_priority_available_provider() {
    let fixture = Fixture::with(
        groq(),
        huggingface(),
        ollama().failing_model("llama3.1:8b", MockFailure::UnsupportedModel),
    );
    let dispatcher = fixture.dispatcher();
    dispatcher.registry().mark_unavailable("groq");

    let result = dispatcher
        .route(&GenerationRequest::new("hello there"))
        .await
        .expect("route should succeed");

    assert_eq!(result.provider, "huggingface");
    assert_eq!(result.model, "microsoft/Phi-3-mini");
    assert!(dispatcher.registry().is_available("ollama"));
}

#[tokio::test]
async fn last_resort_model_differs_from_routed_model() {
    let local = ollama().failing_model("llama3.1:8b", MockFailure::UnsupportedModel);
    let registry = ProviderRegistry::new().with_provider(Arc::new(local.clone()), OLLAMA_RANK);
    let dispatcher = Dispatcher::new(Arc::new(registry), Arc::new(RoutingTable::builtin()));

    let result = dispatcher
        .route(&GenerationRequest::new("hello there"))
        .await
        .expect("route should succeed");

    assert_eq!(result.model, "llama3:8b");
    assert_eq!(local.called_models(), vec!["llama3.1:8b", "llama3:8b"]);
}

#[tokio::test]
async fn routing_is_idempotent() {
    let fixture = Fixture::new();
    let dispatcher = fixture.dispatcher();
    let request = GenerationRequest::new("Write a python function to debug this loop");

    let first = dispatcher.route(&request).await.expect("route should succeed");
    let second = dispatcher.route(&request).await.expect("route should succeed");

    assert_eq!(
        dispatcher.plan(&request).classification,
        Classification::Task(TaskLabel::Coding)
    );
    assert_eq!((first.model.as_str(), first.provider.as_str()), ("llama-3.1-8b-instant", "groq"));
    assert_eq!(first.model, second.model);
    assert_eq!(first.provider, second.provider);
    assert_eq!(first.text, second.text);
}

#[tokio::test]
async fn slow_provider_times_out_and_trips() {
    let slow = groq().with_delay(Duration::from_millis(500));
    let fixture = Fixture::with(slow, huggingface(), ollama());
    let registry = ProviderRegistry::new()
        .with_provider_timeout(
            Arc::new(fixture.groq.clone()),
            GROQ_RANK,
            Duration::from_millis(20),
        )
        .with_provider(Arc::new(fixture.huggingface.clone()), HUGGINGFACE_RANK)
        .with_provider(Arc::new(fixture.ollama.clone()), OLLAMA_RANK);
    let dispatcher = Dispatcher::new(Arc::new(registry), Arc::new(RoutingTable::builtin()));

    let result = dispatcher
        .route(&GenerationRequest::new(SKY_PROMPT))
        .await
        .expect("route should succeed");

    assert_eq!(result.provider, "huggingface");
    assert!(!dispatcher.registry().is_available("groq"));
}

#[tokio::test]
async fn request_options_reach_the_backend() {
    let fixture = Fixture::new();
    let dispatcher = fixture.dispatcher().with_defaults(GenerationOptions {
        max_tokens: 256,
        temperature: 0.1,
    });

    let request = GenerationRequest::new(SKY_PROMPT).with_temperature(0.9);
    dispatcher.route(&request).await.expect("route should succeed");

    let call = fixture.groq.get_call_history().remove(0);
    assert_eq!(call.options.max_tokens, 256);
    assert!((call.options.temperature - 0.9).abs() < f32::EPSILON);
    assert_eq!(call.prompt, SKY_PROMPT);
}

#[tokio::test]
async fn image_intent_hands_off_to_pipeline() {
    let fixture = Fixture::new();
    let images = MockImageGenerator::new();
    let dispatcher = fixture
        .dispatcher()
        .with_image_generator(Arc::new(images.clone()), ImageConfig::default());

    let result = dispatcher
        .route(&GenerationRequest::new("Generate an image of a cat"))
        .await
        .expect("image route should succeed");

    assert_eq!(result.provider, "mock-image");
    assert_eq!(result.images, vec![MockImageGenerator::IMAGE]);
    assert!(result.text.contains("![Generated Image](data:image/png;base64,"));
    assert_eq!(images.prompts(), vec!["Generate an image of a cat"]);
    assert_eq!(fixture.groq.call_count(), 0);
}

#[tokio::test]
async fn image_intent_without_pipeline_fails() {
    let fixture = Fixture::new();
    let dispatcher = fixture.dispatcher();

    let missing = dispatcher
        .route(&GenerationRequest::new("draw me a lighthouse"))
        .await
        .expect_err("no pipeline attached");
    assert!(matches!(missing, RoutingError::ImageGeneration(_)));

    let failing = fixture.dispatcher().with_image_generator(
        Arc::new(MockImageGenerator::new().failing()),
        ImageConfig::default(),
    );
    let error = failing
        .route(&GenerationRequest::new("draw me a lighthouse"))
        .await
        .expect_err("pipeline fails");
    assert!(matches!(error, RoutingError::ImageGeneration(_)));
    assert_eq!(fixture.ollama.call_count(), 0);
}

#[tokio::test]
async fn plan_substitutes_unhosted_models() {
    let fixture = Fixture::with(
        groq(),
        MockProvider::new("huggingface", ["tiiuae/falcon-7b-instruct"]),
        ollama(),
    );
    let dispatcher = fixture.dispatcher();

    let plan = dispatcher.plan(&GenerationRequest::new(SKY_PROMPT));
    assert_eq!(plan.classification, Classification::Task(TaskLabel::Reasoning));
    assert_eq!(
        plan.candidates,
        vec![
            Candidate::new("gemma2-9b-it", "groq"),
            Candidate::new("llama-3.1-8b-instant", "groq"),
            Candidate::new("tiiuae/falcon-7b-instruct", "huggingface"),
            Candidate::new("llama3.1:8b", "ollama"),
        ]
    );
    // The groq last resort is already the second candidate.
    assert_eq!(plan.last_resort, None);
    assert_eq!(fixture.groq.call_count(), 0);
}

#[tokio::test]
async fn plan_reports_distinct_last_resort() {
    let local = ollama();
    let registry = ProviderRegistry::new().with_provider(Arc::new(local.clone()), OLLAMA_RANK);
    let dispatcher = Dispatcher::new(Arc::new(registry), Arc::new(RoutingTable::builtin()));

    let routed = dispatcher.plan(&GenerationRequest::new("hello there"));
    assert_eq!(routed.candidates, vec![Candidate::new("llama3.1:8b", "ollama")]);
    assert_eq!(routed.last_resort, Some(Candidate::new("llama3:8b", "ollama")));

    let explicit = GenerationRequest::new("hello there").with_model("llama3:8b");
    let pinned = dispatcher.plan(&explicit);
    assert_eq!(pinned.explicit, vec![Candidate::new("llama3:8b", "ollama")]);
    assert_eq!(pinned.last_resort, None);
    assert_eq!(local.call_count(), 0);
}

#[tokio::test]
async fn plan_deduplicates_after_substitution() {
    let table = RoutingTable::from_toml_str(
        r#"
version = 1

[routes]
casual = [
    { model = "gpt-4", provider = "groq" },
    { model = "llama-3.1-8b-instant", provider = "groq" },
    { model = "llama3.1:8b", provider = "ollama" },
    { model = "claude", provider = "anthropic" },
]
"#,
    )
    .expect("table should parse");
    let fixture = Fixture::new();
    let dispatcher = Dispatcher::new(Arc::new(fixture.registry()), Arc::new(table));

    let request = GenerationRequest::new("hello there").with_model("codellama:7b");
    let plan = dispatcher.plan(&request);
    assert_eq!(plan.explicit, vec![Candidate::new("codellama:7b", "ollama")]);
    assert_eq!(
        plan.candidates,
        vec![
            Candidate::new("llama-3.1-8b-instant", "groq"),
            Candidate::new("llama3.1:8b", "ollama"),
        ]
    );
}

#[tokio::test]
async fn concurrent_requests_share_breakers() {
    let fixture = Fixture::with(groq().failing(MockFailure::Unreachable), huggingface(), ollama());
    let dispatcher = fixture.dispatcher();
    let first_request = GenerationRequest::new(SKY_PROMPT);
    let second_request = GenerationRequest::new("Summarize the key points of this memo");

    let (first, second) = tokio::join!(
        dispatcher.route(&first_request),
        dispatcher.route(&second_request)
    );

    assert!(matches!(first, Ok(_)));
    assert!(matches!(second, Ok(_)));
    assert!(!dispatcher.registry().is_available("groq"));
}

#[tokio::test]
async fn title_generation_cleans_model_output() {
    let fixture = Fixture::with(
        groq().with_default_response("Title: \"Why The Sky Is Blue\""),
        huggingface(),
        ollama(),
    );
    let dispatcher = fixture.dispatcher();
    let messages = vec![
        ChatMessage::new("user", SKY_PROMPT),
        ChatMessage::new("assistant", "Rayleigh scattering."),
    ];

    let title = TitleGenerator::new(&dispatcher).generate(&messages).await;
    assert_eq!(title.title, "Why The Sky Is Blue");
    assert_eq!(title.provider, "groq");

    let call = fixture.groq.get_call_history().remove(0);
    assert_eq!(call.options.max_tokens, 20);
    assert!(call.prompt.contains("User: Can you explain why the sky is blue?"));
}

#[tokio::test]
async fn title_generation_falls_back_when_routing_fails() {
    let fixture = Fixture::with(
        groq().failing(MockFailure::Unreachable),
        huggingface().failing(MockFailure::Unreachable),
        ollama().failing(MockFailure::Unreachable),
    );
    let dispatcher = fixture.dispatcher();
    let messages = vec![ChatMessage::new("user", "Tips for drawing a car at night")];

    let title = TitleGenerator::new(&dispatcher).generate(&messages).await;
    assert_eq!(title.title, "Tips for drawing a");
    assert_eq!(title.model, "fallback");
    assert_eq!(title.provider, "local");
}

#[tokio::test]
async fn overlong_title_uses_first_words() {
    let fixture = Fixture::with(
        groq().with_default_response(
            "A very long title that keeps going well past the fifty character limit",
        ),
        huggingface(),
        ollama(),
    );
    let dispatcher = fixture.dispatcher();
    let messages = vec![ChatMessage::new("user", "hello there friend, how are you")];

    let title = TitleGenerator::new(&dispatcher).generate(&messages).await;
    assert_eq!(title.title, "hello there friend, how");
    assert_eq!(title.provider, "groq");
}
