use anyhow::Result;
use relay_core::GenerationRequest;
use relay_routing::{ChatMessage, Dispatcher, HealthStatus, RouterConfig, TitleGenerator};
use serde_json::to_string_pretty;
use std::path::{Path, PathBuf};

const ROLES: [&str; 3] = ["user", "assistant", "system"];

/// Loads the configuration at `path`, or the default location when unset.
pub fn load_config(path: Option<&Path>) -> Result<RouterConfig> {
    let config = match path {
        Some(path) => RouterConfig::load_or_create_at(path)?,
        None => RouterConfig::load_or_create()?,
    };
    Ok(config)
}

pub async fn handle_generate(
    dispatcher: &Dispatcher,
    request: &GenerationRequest,
    json: bool,
) -> Result<()> {
    tracing::debug!("Routing prompt of {} chars", request.prompt.len());
    let result = dispatcher.route(request).await?;

    if json {
        println!("{}", to_string_pretty(&result)?);
    } else {
        println!("{}", result.text);
        tracing::info!(
            "Served by {}@{} in {}ms",
            result.model,
            result.provider,
            result.latency_ms
        );
    }
    Ok(())
}

pub fn handle_classify(dispatcher: &Dispatcher, prompt: &str, explain: bool) -> Result<()> {
    let classifier = dispatcher.classifier();
    if explain {
        println!("{}", to_string_pretty(&classifier.explain(prompt))?);
    } else {
        println!("{}", classifier.classify(prompt));
    }
    Ok(())
}

pub fn handle_plan(dispatcher: &Dispatcher, request: &GenerationRequest) {
    let plan = dispatcher.plan(request);

    println!("Classification: {}", plan.classification);
    if !plan.explicit.is_empty() {
        println!("Explicit:");
        for candidate in &plan.explicit {
            println!("  {candidate}");
        }
    }
    if plan.classification.is_image() {
        let pipeline = if dispatcher.image_generator().is_some() {
            "image pipeline"
        } else {
            "no image pipeline configured"
        };
        println!("Handoff: {pipeline}");
        return;
    }

    println!("Candidates:");
    for (index, candidate) in plan.candidates.iter().enumerate() {
        println!("  {}. {candidate}", index + 1);
    }
    match &plan.last_resort {
        Some(candidate) => println!("Last resort: {candidate}"),
        None => println!("Last resort: none (no provider available)"),
    }
}

pub fn handle_models(dispatcher: &Dispatcher, json: bool) -> Result<()> {
    let text_models = dispatcher.registry().known_models();
    let image_models = dispatcher
        .image_generator()
        .map(|generator| generator.models())
        .unwrap_or_default();

    if json {
        let listing = serde_json::json!({
            "text": text_models,
            "image": image_models,
        });
        println!("{}", to_string_pretty(&listing)?);
        return Ok(());
    }

    for model in &text_models {
        let state = if model.is_available {
            "available"
        } else {
            "unavailable"
        };
        println!(
            "{:<32} {:<12} {:>6} tokens  {state}",
            model.name, model.provider, model.max_tokens
        );
    }
    for model in &image_models {
        println!(
            "{:<32} {:<12} image   {}",
            model.name, model.provider, model.description
        );
    }
    Ok(())
}

pub async fn handle_health(dispatcher: &Dispatcher) {
    let report = dispatcher.health().await;

    for provider in &report.providers {
        let status = match provider.status {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy => "unreachable",
            HealthStatus::Tripped => "tripped",
        };
        let location = if provider.is_local { "local" } else { "remote" };
        println!("{:<12} {location:<7} {status}", provider.name);
    }
    match report.image {
        Some(true) => println!("{:<12} {:<7} healthy", "image", "remote"),
        Some(false) => println!("{:<12} {:<7} unreachable", "image", "remote"),
        None => println!("{:<12} {:<7} disabled", "image", "remote"),
    }
}

pub async fn handle_title(dispatcher: &Dispatcher, raw_messages: &[String]) {
    let messages: Vec<ChatMessage> = raw_messages.iter().map(|raw| parse_message(raw)).collect();
    let result = TitleGenerator::new(dispatcher).generate(&messages).await;

    println!("{}", result.title);
    tracing::info!("Title from {}@{}", result.model, result.provider);
}

pub fn handle_config(
    config: &RouterConfig,
    dispatcher: &Dispatcher,
    explicit_path: Option<PathBuf>,
    table: bool,
) -> Result<()> {
    if table {
        print!("{}", dispatcher.table().to_toml_string()?);
        return Ok(());
    }

    let path = match explicit_path {
        Some(path) => path,
        None => RouterConfig::config_path()?,
    };
    let key_status = |provider: &str| {
        if config.get_api_key(provider).is_some() {
            "set"
        } else {
            "not set"
        }
    };

    println!("Configuration: {}", path.display());
    println!("  Groq API key: {}", key_status("groq"));
    println!("  Hugging Face API key: {}", key_status("huggingface"));
    println!("  Ollama: {}", config.providers.ollama.base_url);
    println!(
        "  Defaults: max_tokens={} temperature={}",
        config.generation.max_tokens, config.generation.temperature
    );
    println!(
        "  Image pipeline: {}",
        if config.image.enabled {
            config.image.model.as_str()
        } else {
            "disabled"
        }
    );
    match &config.routing_table {
        Some(table_path) => println!("  Routing table: {}", table_path.display()),
        None => println!("  Routing table: built-in"),
    }
    Ok(())
}

/// Splits `role: content`; text without a known role prefix is a user message.
fn parse_message(raw: &str) -> ChatMessage {
    if let Some((role, content)) = raw.split_once(':') {
        let role = role.trim().to_lowercase();
        if ROLES.contains(&role.as_str()) {
            return ChatMessage::new(role, content.trim());
        }
    }
    ChatMessage::new("user", raw.trim())
}
