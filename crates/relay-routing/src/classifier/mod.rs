//! Intent classification: image detection followed by weighted task scoring.
//!
//! Classification is a pure function of the prompt text and the static tables
//! in [`patterns`]. Image detection always runs first; task scoring is only
//! reached for text prompts.

/// Static keyword and pattern tables.
pub mod patterns;

use crate::types::{Classification, TaskLabel};
use patterns::{CATEGORY_PATTERNS, IMAGE_KEYWORDS, IMAGE_PATTERNS, MATCH_WEIGHT, PRESENCE_BONUS};
use regex::Regex;
use serde::Serialize;

/// Aggregate score of one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryScore {
    /// Category the score belongs to.
    pub label: TaskLabel,
    /// Weighted match count plus presence bonus.
    pub score: u32,
}

/// Kind of image-detection rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// Substring keyword.
    Keyword,
    /// Regular expression.
    Pattern,
}

/// Literal outcome of one image-detection rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleOutcome {
    /// Keyword or pattern.
    pub kind: RuleKind,
    /// The keyword text or pattern source.
    pub rule: String,
    /// Whether the rule fired.
    pub matched: bool,
}

/// Everything the classifier considered for one prompt.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationReport {
    /// Lowercased, trimmed prompt the rules ran against.
    pub normalized_prompt: String,
    /// Whether any image rule fired.
    pub image_intent: bool,
    /// Every keyword then every pattern, in checking order.
    pub rules: Vec<RuleOutcome>,
    /// Category scores in declaration order.
    pub scores: Vec<CategoryScore>,
    /// Label text scoring would pick, even when image intent wins.
    pub task_label: TaskLabel,
    /// Final outcome.
    pub classification: Classification,
}

impl ClassificationReport {
    /// Rules that fired.
    pub fn matched_rules(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.rules.iter().filter(|outcome| outcome.matched)
    }
}

/// Classifies prompts into image intent or a task label.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    /// Creates a classifier over the built-in rule tables.
    pub const fn new() -> Self {
        Self
    }

    fn normalize(prompt: &str) -> String {
        prompt.trim().to_lowercase()
    }

    /// Image detection, then task scoring.
    pub fn classify(&self, prompt: &str) -> Classification {
        let normalized = Self::normalize(prompt);
        if Self::detect_image(&normalized) {
            Classification::Image
        } else {
            Classification::Task(Self::pick_label(&Self::score(&normalized)))
        }
    }

    /// Whether the prompt asks for an image.
    pub fn is_image_request(&self, prompt: &str) -> bool {
        Self::detect_image(&Self::normalize(prompt))
    }

    /// Task label from scoring alone, skipping image detection.
    pub fn classify_task(&self, prompt: &str) -> TaskLabel {
        Self::pick_label(&Self::score(&Self::normalize(prompt)))
    }

    /// Per-category scores in declaration order.
    pub fn scores(&self, prompt: &str) -> Vec<CategoryScore> {
        Self::score(&Self::normalize(prompt))
    }

    /// Full rule-by-rule breakdown for regression tests and debugging.
    pub fn explain(&self, prompt: &str) -> ClassificationReport {
        let normalized = Self::normalize(prompt);

        let keyword_rules = IMAGE_KEYWORDS.iter().map(|keyword| RuleOutcome {
            kind: RuleKind::Keyword,
            rule: (*keyword).to_owned(),
            matched: normalized.contains(keyword),
        });
        let pattern_rules = IMAGE_PATTERNS.iter().map(|pattern| RuleOutcome {
            kind: RuleKind::Pattern,
            rule: pattern.as_str().to_owned(),
            matched: pattern.is_match(&normalized),
        });
        let rules: Vec<_> = keyword_rules.chain(pattern_rules).collect();

        let image_intent = rules.iter().any(|outcome| outcome.matched);
        let scores = Self::score(&normalized);
        let task_label = Self::pick_label(&scores);

        ClassificationReport {
            normalized_prompt: normalized,
            image_intent,
            rules,
            scores,
            task_label,
            classification: if image_intent {
                Classification::Image
            } else {
                Classification::Task(task_label)
            },
        }
    }

    fn detect_image(normalized: &str) -> bool {
        IMAGE_KEYWORDS
            .iter()
            .any(|keyword| normalized.contains(keyword))
            || IMAGE_PATTERNS
                .iter()
                .any(|pattern| pattern.is_match(normalized))
    }

    fn pattern_score(pattern: &Regex, normalized: &str) -> u32 {
        let hits = pattern.find_iter(normalized).count() as u32;
        if hits == 0 {
            0
        } else {
            hits * MATCH_WEIGHT + PRESENCE_BONUS
        }
    }

    fn score(normalized: &str) -> Vec<CategoryScore> {
        CATEGORY_PATTERNS
            .iter()
            .map(|category| CategoryScore {
                label: category.label,
                score: category
                    .patterns
                    .iter()
                    .map(|pattern| Self::pattern_score(pattern, normalized))
                    .sum(),
            })
            .collect()
    }

    /// Highest score wins; the first maximum in declaration order breaks ties.
    fn pick_label(scores: &[CategoryScore]) -> TaskLabel {
        let mut best: Option<CategoryScore> = None;
        for entry in scores {
            if best.is_none_or(|current| entry.score > current.score) {
                best = Some(*entry);
            }
        }

        match best {
            Some(entry) if entry.score > 0 => entry.label,
            _ => TaskLabel::Casual,
        }
    }
}
