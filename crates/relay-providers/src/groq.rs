use async_trait::async_trait;
use relay_core::{Completion, Error, GenerationOptions, ModelProvider, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;

/// Groq OpenAI-compatible API base URL.
const GROQ_API_URL: &str = "https://api.groq.com/openai/v1";
/// Env var key for Groq API key.
const ENV_GROQ_API_KEY: &str = "GROQ_API_KEY";
/// Registry name of this provider.
pub const PROVIDER_NAME: &str = "groq";
/// Models confirmed to be served on the Groq free tier.
pub const DEFAULT_MODELS: [&str; 4] = [
    "llama-3.1-8b-instant",
    "llama3-8b-8192",
    "gemma2-9b-it",
    "gemma-7b-it",
];

/// Groq API provider (free tier with rate limits).
pub struct GroqProvider {
    /// HTTP client for API requests.
    client: Client,
    /// Groq API key, absent when not configured.
    api_key: Option<String>,
    /// API base URL.
    base_url: String,
    /// Models this provider claims to serve.
    models: Vec<String>,
}

impl GroqProvider {
    /// Creates a provider with an optional API key. An empty key counts as absent.
    pub fn new(api_key: Option<String>) -> Self {
        let api_key = api_key.filter(|key| !key.trim().is_empty());
        tracing::debug!(
            "Groq API key loaded: {}",
            if api_key.is_some() { "yes" } else { "no" }
        );

        Self {
            client: Client::default(),
            api_key,
            base_url: GROQ_API_URL.to_owned(),
            models: DEFAULT_MODELS.iter().map(|model| (*model).to_owned()).collect(),
        }
    }

    /// Creates a provider from the `GROQ_API_KEY` environment variable.
    pub fn from_env() -> Self {
        Self::new(env::var(ENV_GROQ_API_KEY).ok())
    }

    /// Overrides the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_owned();
        self
    }

    /// Replaces the static model list.
    #[must_use]
    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = models;
        self
    }

    fn build_request(model: &str, prompt: &str, options: &GenerationOptions) -> GroqRequest {
        GroqRequest {
            model: model.to_owned(),
            messages: vec![GroqMessage {
                role: "user".to_owned(),
                content: prompt.to_owned(),
            }],
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stream: false,
        }
    }
}

/// Request payload sent to the Groq chat completion API.
#[derive(Debug, Serialize)]
struct GroqRequest {
    /// Model identifier provided by the Groq service.
    model: String,
    /// Messages that form the conversation context for the request.
    messages: Vec<GroqMessage>,
    /// Sampling temperature controlling response randomness.
    temperature: f32,
    /// Maximum number of tokens allowed in the completion.
    max_tokens: u32,
    /// Streaming is never requested.
    stream: bool,
}

/// Message delivered to the Groq API.
#[derive(Debug, Serialize)]
struct GroqMessage {
    /// Role of the message author (for example `system` or `user`).
    role: String,
    /// Textual content of the message.
    content: String,
}

/// Response payload returned by Groq.
#[derive(Debug, Deserialize)]
struct GroqResponse {
    /// List of candidate completions.
    choices: Vec<GroqChoice>,
    /// Token accounting information for the request.
    usage: Option<GroqUsage>,
}

/// A single completion choice returned by Groq.
#[derive(Debug, Deserialize)]
struct GroqChoice {
    /// Message generated for the choice.
    message: GroqResponseMessage,
}

/// Response message containing the generated text.
#[derive(Debug, Deserialize)]
struct GroqResponseMessage {
    /// Generated text content.
    content: String,
}

/// Token usage metrics for a Groq response.
#[derive(Debug, Deserialize)]
struct GroqUsage {
    /// Prompt plus completion tokens.
    total_tokens: u64,
}

#[async_trait]
impl ModelProvider for GroqProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn is_local(&self) -> bool {
        false
    }

    fn models(&self) -> &[String] {
        &self.models
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(
        &self,
        prompt: &str,
        model: &str,
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::MissingApiKey(ENV_GROQ_API_KEY.to_owned()))?;

        if !self.hosts_model(model) {
            return Err(Error::UnsupportedModel(format!(
                "Model {model} not available in Groq"
            )));
        }

        let request = Self::build_request(model, prompt, options);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_owned());
            return Err(Error::from_status("Groq", status, &error_text));
        }

        let groq_response: GroqResponse = response
            .json()
            .await
            .map_err(|err| {
                Error::InvalidResponse(format!("Failed to parse Groq response: {err}"))
            })?;

        let text = groq_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::InvalidResponse("No response from Groq".to_owned()))?;

        Ok(Completion {
            text,
            tokens_used: groq_response.usage.map(|usage| usage.total_tokens),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, from_str, to_value};

    #[test]
    fn groq_provider_with_api_key() {
        let provider = GroqProvider::new(Some("test_key".to_owned()));

        assert_eq!(provider.name(), "groq");
        assert!(provider.is_configured());
        assert!(!provider.is_local());
        assert!(provider.hosts_model("gemma2-9b-it"));
        assert!(!provider.hosts_model("llama3.1:8b"));
    }

    #[test]
    fn blank_api_key_is_unconfigured() {
        let provider = GroqProvider::new(Some("   ".to_owned()));
        assert!(!provider.is_configured());
    }

    #[tokio::test]
    async fn missing_key_fails_before_network() {
        let provider = GroqProvider::new(None);
        let result = provider
            .generate("hi", "llama-3.1-8b-instant", &GenerationOptions::default())
            .await;
        assert!(matches!(result, Err(Error::MissingApiKey(_))));
    }

    #[tokio::test]
    async fn unknown_model_is_model_specific() {
        let provider = GroqProvider::new(Some("test_key".to_owned()));
        let result = provider
            .generate("hi", "codellama:7b", &GenerationOptions::default())
            .await;
        match result {
            Err(error) => assert!(!error.is_provider_fault()),
            Ok(_) => panic!("unhosted model should fail"),
        }
    }

    #[test]
    fn request_payload_shape() {
        let options = GenerationOptions {
            max_tokens: 20,
            temperature: 0.3,
        };
        let request = GroqProvider::build_request("gemma2-9b-it", "Title please", &options);
        let json = match to_value(&request) {
            Ok(json) => json,
            Err(error) => panic!("serialize failed: {error}"),
        };
        assert_eq!(json["model"], "gemma2-9b-it");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Title please");
        assert_eq!(json["max_tokens"], 20);
        assert_eq!(json["stream"], Value::Bool(false));
    }

    #[test]
    fn response_without_usage_parses() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hi"}}]}"#;
        let parsed: GroqResponse = match from_str(body) {
            Ok(parsed) => parsed,
            Err(error) => panic!("parse failed: {error}"),
        };
        assert!(parsed.usage.is_none());
        assert_eq!(parsed.choices[0].message.content, "Hi");
    }
}
