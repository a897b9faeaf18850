//! Relay CLI - route prompts across free-tier and local LLM backends
#![cfg_attr(
    test,
    allow(
        clippy::missing_panics_doc,
        clippy::missing_errors_doc,
        reason = "Allow for tests"
    )
)]

use anyhow::Result;
use clap::Parser as _;
use std::io::stderr;
use relay_core::GenerationRequest;
use relay_routing::Dispatcher;
use tracing_subscriber::{
    EnvFilter, fmt, layer::SubscriberExt as _, registry, util::SubscriberInitExt as _,
};

mod cli;
#[allow(clippy::print_stdout, reason = "command results are written to stdout")]
mod handlers;

use cli::{Cli, Commands};

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "relay=debug" } else { "relay=info" };
    registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(fmt::layer().with_writer(stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = handlers::load_config(cli.config.as_deref())?;
    let dispatcher = Dispatcher::from_config(&config)?;

    match cli.command {
        Commands::Generate {
            prompt,
            model,
            max_tokens,
            temperature,
            json,
        } => {
            let mut request = GenerationRequest::new(prompt);
            if let Some(model) = model {
                request = request.with_model(model);
            }
            if let Some(max_tokens) = max_tokens {
                request = request.with_max_tokens(max_tokens);
            }
            if let Some(temperature) = temperature {
                request = request.with_temperature(temperature);
            }
            handlers::handle_generate(&dispatcher, &request, json).await?;
        }
        Commands::Classify { prompt, explain } => {
            handlers::handle_classify(&dispatcher, &prompt, explain)?;
        }
        Commands::Plan { prompt, model } => {
            let mut request = GenerationRequest::new(prompt);
            if let Some(model) = model {
                request = request.with_model(model);
            }
            handlers::handle_plan(&dispatcher, &request);
        }
        Commands::Models { json } => {
            handlers::handle_models(&dispatcher, json)?;
        }
        Commands::Health => {
            handlers::handle_health(&dispatcher).await;
        }
        Commands::Title { messages } => {
            handlers::handle_title(&dispatcher, &messages).await;
        }
        Commands::Config { table } => {
            handlers::handle_config(&config, &dispatcher, cli.config, table)?;
        }
    }

    Ok(())
}
