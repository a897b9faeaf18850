//! Versioned routing table: preferred candidates per task label plus the
//! per-provider substitution and last-resort models.

use crate::error::{Result, RoutingError};
use crate::types::{Candidate, TaskLabel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Version of the built-in table and the newest version accepted from files.
pub const TABLE_VERSION: u32 = 1;

const BUILTIN_ROUTES: [(TaskLabel, &[(&str, &str)]); 7] = [
    (
        TaskLabel::Reasoning,
        &[
            ("gemma2-9b-it", "groq"),
            ("llama-3.1-8b-instant", "groq"),
            ("microsoft/Phi-3-mini", "huggingface"),
            ("llama3.1:8b", "ollama"),
        ],
    ),
    (
        TaskLabel::Coding,
        &[
            ("llama-3.1-8b-instant", "groq"),
            ("gemma2-9b-it", "groq"),
            ("codellama:7b", "ollama"),
        ],
    ),
    (
        TaskLabel::Creative,
        &[
            ("gemma2-9b-it", "groq"),
            ("llama-3.1-8b-instant", "groq"),
            ("microsoft/Phi-3-mini", "huggingface"),
            ("llama3.1:8b", "ollama"),
        ],
    ),
    (
        TaskLabel::Summarization,
        &[
            ("llama-3.1-8b-instant", "groq"),
            ("gemma2-9b-it", "groq"),
            ("mistral:7b", "ollama"),
        ],
    ),
    (
        TaskLabel::Historical,
        &[
            ("gemma2-9b-it", "groq"),
            ("llama-3.1-8b-instant", "groq"),
            ("llama3.1:8b", "ollama"),
        ],
    ),
    (
        TaskLabel::Educational,
        &[
            ("gemma2-9b-it", "groq"),
            ("llama-3.1-8b-instant", "groq"),
            ("llama3.1:8b", "ollama"),
        ],
    ),
    (
        TaskLabel::Casual,
        &[
            ("llama-3.1-8b-instant", "groq"),
            ("gemma2-9b-it", "groq"),
            ("llama3.1:8b", "ollama"),
        ],
    ),
];

/// (provider, complex-task model, simple-task model, last resort)
const BUILTIN_FALLBACKS: [(&str, &str, &str, &str); 3] = [
    ("groq", "gemma2-9b-it", "llama-3.1-8b-instant", "llama-3.1-8b-instant"),
    (
        "huggingface",
        "microsoft/Phi-3-mini",
        "microsoft/Phi-3-mini",
        "microsoft/Phi-3-mini",
    ),
    ("ollama", "llama3.1:8b", "llama3.1:8b", "llama3:8b"),
];

/// Models a provider offers in place of a table entry it does not host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFallback {
    /// Used for reasoning, coding, historical and educational tasks.
    pub complex: String,
    /// Used for the remaining task labels.
    pub simple: String,
    /// Tried once after every candidate failed.
    pub last_resort: String,
}

/// Versioned mapping from task label to preferred candidates, plus the
/// per-provider substitutes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingTable {
    version: u32,
    routes: BTreeMap<TaskLabel, Vec<Candidate>>,
    fallbacks: BTreeMap<String, ProviderFallback>,
}

/// On-disk shape of a routing table.
#[derive(Debug, Serialize, Deserialize)]
struct TableDocument {
    version: u32,
    routes: BTreeMap<String, Vec<Candidate>>,
    #[serde(default)]
    fallbacks: BTreeMap<String, ProviderFallback>,
}

impl RoutingTable {
    /// The built-in version 1 table.
    pub fn builtin() -> Self {
        let routes = BUILTIN_ROUTES
            .iter()
            .map(|(label, pairs)| {
                let candidates = pairs
                    .iter()
                    .map(|(model, provider)| Candidate::new(*model, *provider))
                    .collect();
                (*label, candidates)
            })
            .collect();

        Self {
            version: TABLE_VERSION,
            routes,
            fallbacks: Self::builtin_fallbacks(),
        }
    }

    fn builtin_fallbacks() -> BTreeMap<String, ProviderFallback> {
        BUILTIN_FALLBACKS
            .iter()
            .map(|(provider, complex, simple, last_resort)| {
                (
                    (*provider).to_owned(),
                    ProviderFallback {
                        complex: (*complex).to_owned(),
                        simple: (*simple).to_owned(),
                        last_resort: (*last_resort).to_owned(),
                    },
                )
            })
            .collect()
    }

    /// Parses a table document. Fallbacks absent from the document keep their
    /// built-in values.
    ///
    /// # Errors
    /// Returns an error if the document does not parse, carries an unsupported
    /// version, or lacks the `casual` entry every other label falls back to.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let document: TableDocument = toml::from_str(contents).map_err(|error| {
            RoutingError::Configuration(format!("Failed to parse routing table: {error}"))
        })?;

        if document.version == 0 || document.version > TABLE_VERSION {
            return Err(RoutingError::Configuration(format!(
                "Unsupported routing table version {} (supported: 1..={TABLE_VERSION})",
                document.version
            )));
        }

        let mut routes = BTreeMap::new();
        for (name, candidates) in document.routes {
            let label = name
                .parse::<TaskLabel>()
                .map_err(RoutingError::Configuration)?;
            routes.insert(label, candidates);
        }

        if routes.get(&TaskLabel::Casual).is_none_or(Vec::is_empty) {
            return Err(RoutingError::Configuration(
                "Routing table must define a non-empty casual entry".to_owned(),
            ));
        }

        let mut fallbacks = document.fallbacks;
        for (provider, fallback) in Self::builtin_fallbacks() {
            fallbacks.entry(provider).or_insert(fallback);
        }

        Ok(Self {
            version: document.version,
            routes,
            fallbacks,
        })
    }

    /// Loads a table document from disk.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a valid table.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|error| {
            RoutingError::Configuration(format!(
                "Failed to read routing table {}: {error}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Serializes the table in the format [`RoutingTable::from_toml_str`] reads.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_toml_string(&self) -> Result<String> {
        let document = TableDocument {
            version: self.version,
            routes: self
                .routes
                .iter()
                .map(|(label, candidates)| (label.as_str().to_owned(), candidates.clone()))
                .collect(),
            fallbacks: self.fallbacks.clone(),
        };
        toml::to_string_pretty(&document).map_err(|error| {
            RoutingError::Configuration(format!("Failed to serialize routing table: {error}"))
        })
    }

    /// Table version; bumped whenever the routing changes.
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Preferred candidates for a label, independent of availability.
    /// Labels without an entry use the casual entry.
    pub fn preferred_candidates(&self, label: TaskLabel) -> &[Candidate] {
        self.routes
            .get(&label)
            .or_else(|| self.routes.get(&TaskLabel::Casual))
            .map_or(&[], Vec::as_slice)
    }

    /// The provider's own model for a task of this shape.
    pub fn substitute_model(&self, provider: &str, label: TaskLabel) -> Option<&str> {
        self.fallbacks.get(provider).map(|fallback| {
            if label.is_complex() {
                fallback.complex.as_str()
            } else {
                fallback.simple.as_str()
            }
        })
    }

    /// The provider's model for the final attempt.
    pub fn last_resort_model(&self, provider: &str) -> Option<&str> {
        self.fallbacks
            .get(provider)
            .map(|fallback| fallback.last_resort.as_str())
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_reasoning_order() {
        let table = RoutingTable::builtin();
        let reasoning: Vec<String> = table
            .preferred_candidates(TaskLabel::Reasoning)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            reasoning,
            vec![
                "gemma2-9b-it@groq",
                "llama-3.1-8b-instant@groq",
                "microsoft/Phi-3-mini@huggingface",
                "llama3.1:8b@ollama",
            ]
        );
        assert_eq!(table.version(), 1);
    }

    #[test]
    fn every_label_has_an_entry() {
        let table = RoutingTable::builtin();
        for label in TaskLabel::ALL {
            assert!(!table.preferred_candidates(label).is_empty(), "{label}");
        }
    }

    #[test]
    fn substitution_follows_task_shape() {
        let table = RoutingTable::builtin();
        assert_eq!(
            table.substitute_model("groq", TaskLabel::Coding),
            Some("gemma2-9b-it")
        );
        assert_eq!(
            table.substitute_model("groq", TaskLabel::Casual),
            Some("llama-3.1-8b-instant")
        );
        assert_eq!(table.last_resort_model("ollama"), Some("llama3:8b"));
        assert_eq!(table.substitute_model("openai", TaskLabel::Casual), None);
    }

    #[test]
    fn override_falls_back_to_casual() {
        let document = r#"
version = 1

[routes]
casual = [{ model = "mistral:7b", provider = "ollama" }]
coding = [{ model = "codellama:7b", provider = "ollama" }]
"#;
        let table = match RoutingTable::from_toml_str(document) {
            Ok(table) => table,
            Err(error) => panic!("parse failed: {error}"),
        };

        assert_eq!(
            table.preferred_candidates(TaskLabel::Creative),
            &[Candidate::new("mistral:7b", "ollama")]
        );
        assert_eq!(
            table.preferred_candidates(TaskLabel::Coding),
            &[Candidate::new("codellama:7b", "ollama")]
        );
        assert_eq!(table.last_resort_model("groq"), Some("llama-3.1-8b-instant"));
    }

    #[test]
    fn override_validation() {
        let future = "version = 2\n[routes]\ncasual = [{ model = \"a\", provider = \"b\" }]\n";
        assert!(matches!(
            RoutingTable::from_toml_str(future),
            Err(RoutingError::Configuration(_))
        ));

        let no_casual = "version = 1\n[routes]\ncoding = [{ model = \"a\", provider = \"b\" }]\n";
        assert!(matches!(
            RoutingTable::from_toml_str(no_casual),
            Err(RoutingError::Configuration(_))
        ));

        let unknown_label = "version = 1\n[routes]\npoetry = []\n";
        assert!(matches!(
            RoutingTable::from_toml_str(unknown_label),
            Err(RoutingError::Configuration(message)) if message.contains("poetry")
        ));
    }

    #[test]
    fn serialized_table_reloads() {
        let table = RoutingTable::builtin();
        let text = match table.to_toml_string() {
            Ok(text) => text,
            Err(error) => panic!("serialize failed: {error}"),
        };
        match RoutingTable::from_toml_str(&text) {
            Ok(reloaded) => assert_eq!(reloaded, table),
            Err(error) => panic!("reload failed: {error}"),
        }
    }
}
