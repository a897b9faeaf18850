use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "relay")]
#[command(about = "Route prompts across free-tier and local LLM backends", long_about = None)]
pub struct Cli {
    #[arg(long, global = true, help = "Configuration file (defaults to ~/.relay/config.toml)")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Route a prompt and print the generated text")]
    Generate {
        #[arg(help = "The prompt to route")]
        prompt: String,

        #[arg(short, long, help = "Try this model first")]
        model: Option<String>,

        #[arg(long, help = "Maximum number of tokens to generate")]
        max_tokens: Option<u32>,

        #[arg(long, help = "Sampling temperature")]
        temperature: Option<f32>,

        #[arg(long, help = "Print the full result as JSON")]
        json: bool,
    },

    #[command(about = "Classify a prompt without calling any backend")]
    Classify {
        #[arg(help = "The prompt to classify")]
        prompt: String,

        #[arg(long, help = "Print every rule outcome and category score as JSON")]
        explain: bool,
    },

    #[command(about = "Show the candidates a prompt would be routed through")]
    Plan {
        #[arg(help = "The prompt to plan")]
        prompt: String,

        #[arg(short, long, help = "Explicitly requested model")]
        model: Option<String>,
    },

    #[command(about = "List the text and image models the registry knows")]
    Models {
        #[arg(long, help = "Print the list as JSON")]
        json: bool,
    },

    #[command(about = "Check every backend and the image pipeline")]
    Health,

    #[command(about = "Generate a conversation title")]
    Title {
        #[arg(
            required = true,
            help = "Messages as `role: content`; a message without a role is from the user"
        )]
        messages: Vec<String>,
    },

    #[command(about = "Show configuration")]
    Config {
        #[arg(long, help = "Print the effective routing table as TOML")]
        table: bool,
    },
}
