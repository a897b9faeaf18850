//! Routing vocabulary: task labels, classification outcomes and candidates.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

/// Category assigned to a text prompt for routing purposes.
///
/// Declaration order is significant: it is the tie-break order used by the
/// classifier.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TaskLabel {
    /// Explanations, analysis and step-by-step problem solving.
    Reasoning,
    /// Writing, debugging or reviewing code.
    Coding,
    /// Stories, poems and other imaginative writing.
    Creative,
    /// Condensing a longer text.
    Summarization,
    /// Questions about past events and periods.
    Historical,
    /// Teaching and learning requests.
    Educational,
    /// Small talk; also the label when nothing else scores.
    #[default]
    Casual,
}

impl TaskLabel {
    /// All labels in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Reasoning,
        Self::Coding,
        Self::Creative,
        Self::Summarization,
        Self::Historical,
        Self::Educational,
        Self::Casual,
    ];

    /// Lowercase name used in tables and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reasoning => "reasoning",
            Self::Coding => "coding",
            Self::Creative => "creative",
            Self::Summarization => "summarization",
            Self::Historical => "historical",
            Self::Educational => "educational",
            Self::Casual => "casual",
        }
    }

    /// Complex tasks prefer larger models when a provider substitutes its own.
    pub const fn is_complex(self) -> bool {
        matches!(
            self,
            Self::Reasoning | Self::Coding | Self::Historical | Self::Educational
        )
    }
}

impl fmt::Display for TaskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskLabel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("unknown task label: {value}"))
    }
}

/// Outcome of intent classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "intent", content = "label", rename_all = "snake_case")]
pub enum Classification {
    /// The prompt asks for an image; text routing is skipped.
    Image,
    /// A text task with its label.
    Task(TaskLabel),
}

impl Classification {
    /// Whether the prompt asks for an image.
    pub const fn is_image(self) -> bool {
        matches!(self, Self::Image)
    }

    /// Task label, if this is a text task.
    pub const fn label(self) -> Option<TaskLabel> {
        match self {
            Self::Image => None,
            Self::Task(label) => Some(label),
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => f.write_str("image-generation"),
            Self::Task(label) => label.fmt(f),
        }
    }
}

/// One (model, provider) attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    /// Model identifier.
    pub model: String,
    /// Registry name of the provider.
    pub provider: String,
}

impl Candidate {
    /// Pairs a model with the provider that should serve it.
    pub fn new(model: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            provider: provider.into(),
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.model, self.provider)
    }
}
