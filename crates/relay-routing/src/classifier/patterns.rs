//! Static detection tables.

use crate::types::TaskLabel;
use regex::Regex;
use std::sync::LazyLock;

/// Score added per pattern match.
pub const MATCH_WEIGHT: u32 = 2;
/// Score added once when a pattern matches at all.
pub const PRESENCE_BONUS: u32 = 1;

/// Phrases that mark an image request on plain substring containment.
pub const IMAGE_KEYWORDS: [&str; 51] = [
    "generate image",
    "generate an image",
    "generate a image",
    "create image",
    "create an image",
    "create a image",
    "make image",
    "make an image",
    "make a image",
    "draw image",
    "draw an image",
    "draw a image",
    "paint image",
    "paint an image",
    "paint a image",
    "sketch image",
    "sketch an image",
    "sketch a image",
    "design image",
    "design an image",
    "design a image",
    "generate picture",
    "generate a picture",
    "generate an picture",
    "create picture",
    "create a picture",
    "create an picture",
    "make picture",
    "make a picture",
    "make an picture",
    "draw picture",
    "draw a picture",
    "draw an picture",
    "paint picture",
    "paint a picture",
    "paint an picture",
    "generate photo",
    "create photo",
    "make photo",
    "generate art",
    "create art",
    "make art",
    "generate artwork",
    "create artwork",
    "make artwork",
    "draw me",
    "paint me",
    "sketch me",
    "show me",
    "visualize",
    "render",
];

/// Image patterns, tried in order after the keywords.
pub const IMAGE_PATTERN_SOURCES: [&str; 8] = [
    r"\b(generate|create|make|draw|paint|sketch|illustrate|design)\s+(an?\s+)?(image|picture|photo|drawing|painting|artwork|visual)\b",
    r"\b(generate|create|make)\s+(an?\s+)?(image|picture|photo|drawing|painting)\s+of\b",
    r"\b(draw|paint|sketch|illustrate)\s+(me\s+)?(an?\s+)?\w+",
    r"\b(show|visualize|render)\s+(an?\s+)?(image|picture|visual)\b",
    r"\b(image|picture|photo|drawing|painting)\s+of\s+\w+",
    r"\b(art|artwork|visual)\s+(of|showing|depicting)\b",
    r"\b(image|picture|photo|drawing|painting)\s+of\s+",
    r"\b(draw|paint|sketch|illustrate|design|create|generate|make)\s+.*\b(car|bmw|landscape|person|animal|building|scene)",
];

/// Category patterns in tie-break order.
pub const CATEGORY_PATTERN_SOURCES: [(TaskLabel, &[&str]); 7] = [
    (
        TaskLabel::Reasoning,
        &[
            r"\b(explain|explanation|describe|detail|analysis|analyze|why|how|what|when|where)\b",
            r"\b(think|reason|logic|problem|solve|calculate|understand)\b",
            r"\b(step by step|logical|rational|deduce|infer|because|therefore)\b",
            r"\b(detailed|comprehensive|thorough|in-depth|elaborate)\b",
        ],
    ),
    (
        TaskLabel::Coding,
        &[
            r"\b(code|program|function|class|algorithm|bug|debug|implement|write|script)\b",
            r"\b(python|javascript|java|c\+\+|html|css|sql|api|programming)\b",
            r"\b(loop|if|else|while|for|try|catch|exception|variable|array|list)\b",
            r"\b(reverse|sort|filter|map|reduce|iterate|return)\b",
        ],
    ),
    (
        TaskLabel::Creative,
        &[
            r"\b(write|create|story|poem|song|design|imagine|creative|compose)\b",
            r"\b(narrative|fiction|fantasy|adventure|romance|mystery|novel)\b",
            r"\b(describe|lyrics|character|plot|scene)\b",
        ],
    ),
    (
        TaskLabel::Summarization,
        &[
            r"\b(summarize|summary|brief|overview|key points|main ideas|outline)\b",
            r"\b(condense|shorten|abbreviate|extract|highlight|recap)\b",
            r"\b(tl;dr|too long|didn't read|in short|briefly)\b",
        ],
    ),
    (
        TaskLabel::Historical,
        &[
            r"\b(history|historical|war|world war|battle|ancient|medieval|century)\b",
            r"\b(timeline|chronology|events|dates|period|era|age)\b",
            r"\b(civilization|empire|revolution|independence|treaty)\b",
        ],
    ),
    (
        TaskLabel::Educational,
        &[
            r"\b(learn|teach|education|lesson|course|study|academic)\b",
            r"\b(definition|concept|theory|principle|formula|equation)\b",
            r"\b(university|school|college|student|professor|research)\b",
        ],
    ),
    (
        TaskLabel::Casual,
        &[
            r"\b(hello|hi|hey|how are you|what's up|chat|talk)\b",
            r"\b(weather|food|movie|book|music|hobby|interest)\b",
            r"\b(opinion|thought|feel|like|dislike|prefer)\b",
        ],
    ),
];

/// Compiled patterns for one category.
pub struct CategoryPatterns {
    /// Category the patterns vote for.
    pub label: TaskLabel,
    /// Compiled patterns.
    pub patterns: Vec<Regex>,
}

fn compile(source: &str) -> Regex {
    match Regex::new(source) {
        Ok(regex) => regex,
        Err(err) => panic!("Classifier pattern {source} is invalid: {err}"),
    }
}

/// Compiled image-intent patterns.
pub static IMAGE_PATTERNS: LazyLock<Vec<Regex>> =
    LazyLock::new(|| IMAGE_PATTERN_SOURCES.iter().map(|source| compile(source)).collect());

/// Compiled task patterns, in label declaration order.
pub static CATEGORY_PATTERNS: LazyLock<Vec<CategoryPatterns>> = LazyLock::new(|| {
    CATEGORY_PATTERN_SOURCES
        .iter()
        .map(|(label, sources)| CategoryPatterns {
            label: *label,
            patterns: sources.iter().map(|source| compile(source)).collect(),
        })
        .collect()
});
