//! Short conversation titles generated through the dispatcher.

use crate::dispatch::Dispatcher;
use core::ops::RangeInclusive;
use relay_core::GenerationRequest;
use serde::{Deserialize, Serialize};

/// Leading messages included in the title prompt.
const CONTEXT_MESSAGES: usize = 6;
const TITLE_MAX_TOKENS: u32 = 20;
const TITLE_TEMPERATURE: f32 = 0.3;
/// Accepted title length in characters.
const TITLE_LENGTH: RangeInclusive<usize> = 3..=50;
/// Words of the first user message used as a fallback title.
const FALLBACK_WORDS: usize = 4;
const EMPTY_TITLE: &str = "New Chat";

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `user`, `assistant` or `system`.
    #[serde(default = "default_role")]
    pub role: String,
    /// Message text.
    #[serde(default)]
    pub content: String,
}

fn default_role() -> String {
    "user".to_owned()
}

impl ChatMessage {
    /// Creates a message with the given role.
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// A generated title and where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleResult {
    /// Cleaned title text.
    pub title: String,
    /// Model that produced the title, or `fallback`.
    pub model: String,
    /// Provider that produced the title, or `local` for fallback titles.
    pub provider: String,
    /// Routing time; zero for fallback titles.
    pub latency_ms: u64,
}

/// Generates titles for conversations. Never fails: routing errors produce a
/// title taken from the first user message.
pub struct TitleGenerator<'dispatcher> {
    dispatcher: &'dispatcher Dispatcher,
}

impl<'dispatcher> TitleGenerator<'dispatcher> {
    /// Creates a generator routing through `dispatcher`.
    pub const fn new(dispatcher: &'dispatcher Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Titles the conversation from its leading messages.
    pub async fn generate(&self, messages: &[ChatMessage]) -> TitleResult {
        let prompt = Self::build_prompt(messages);
        let request = GenerationRequest::new(prompt)
            .with_max_tokens(TITLE_MAX_TOKENS)
            .with_temperature(TITLE_TEMPERATURE);

        // Title prompts quote arbitrary chat text, so only task scoring is used.
        let label = self.dispatcher.classifier().classify_task(&request.prompt);

        match self.dispatcher.route_task(&request, label).await {
            Ok(result) => {
                let cleaned = Self::clean(&result.text);
                let title = if TITLE_LENGTH.contains(&cleaned.chars().count()) {
                    cleaned
                } else {
                    Self::fallback_title(messages)
                };
                TitleResult {
                    title,
                    model: result.model,
                    provider: result.provider,
                    latency_ms: result.latency_ms,
                }
            }
            Err(error) => {
                tracing::warn!("Title generation failed, using fallback: {error}");
                TitleResult {
                    title: Self::fallback_title(messages),
                    model: "fallback".to_owned(),
                    provider: "local".to_owned(),
                    latency_ms: 0,
                }
            }
        }
    }

    fn build_prompt(messages: &[ChatMessage]) -> String {
        let mut conversation = String::new();
        for message in messages.iter().take(CONTEXT_MESSAGES) {
            conversation.push_str(&capitalize(&message.role));
            conversation.push_str(": ");
            conversation.push_str(&message.content);
            conversation.push('\n');
        }

        format!(
            "Based on the following conversation, generate a concise, descriptive title \
             (3-6 words) that captures the main topic or question. Do not use quotes or \
             special characters. Just return the title.\n\nConversation:\n{conversation}\n\nTitle:"
        )
    }

    fn clean(raw: &str) -> String {
        raw.trim()
            .replace("Title:", "")
            .trim()
            .replace(['"', '\''], "")
            .trim()
            .to_owned()
    }

    fn fallback_title(messages: &[ChatMessage]) -> String {
        let words: Vec<&str> = messages
            .iter()
            .find(|message| message.role == "user")
            .map(|message| {
                message
                    .content
                    .split_whitespace()
                    .take(FALLBACK_WORDS)
                    .collect()
            })
            .unwrap_or_default();

        if words.is_empty() {
            EMPTY_TITLE.to_owned()
        } else {
            words.join(" ")
        }
    }
}

/// Uppercases the first character and lowercases the rest.
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect()
    })
}
