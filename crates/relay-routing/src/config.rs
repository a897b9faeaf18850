//! Router configuration: provider credentials and timeouts, generation
//! defaults, the image pipeline and an optional routing table override.

use crate::error::{Result, RoutingError};
use relay_core::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, GenerationOptions};
use relay_providers::image::DEFAULT_IMAGE_MODEL;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Env var key for the Groq API key.
pub const ENV_GROQ_API_KEY: &str = "GROQ_API_KEY";
/// Env var key for the Hugging Face token.
pub const ENV_HUGGINGFACE_API_KEY: &str = "HUGGINGFACE_API_KEY";

/// Complete router configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Backend settings
    pub providers: ProvidersConfig,
    /// Defaults applied when a request leaves parameters unset
    pub generation: GenerationConfig,
    /// Image pipeline settings
    pub image: ImageConfig,
    /// Optional TOML file replacing the built-in routing table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_table: Option<PathBuf>,
}

/// Settings for every known backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Groq API
    pub groq: RemoteProviderConfig,
    /// Hugging Face Inference API
    pub huggingface: RemoteProviderConfig,
    /// Local Ollama daemon
    pub ollama: LocalProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            groq: RemoteProviderConfig::with_timeout(30),
            huggingface: RemoteProviderConfig::with_timeout(60),
            ollama: LocalProviderConfig::default(),
        }
    }
}

/// A hosted backend that needs an API key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteProviderConfig {
    /// Whether the backend is registered at all
    pub enabled: bool,
    /// API key; the environment is consulted when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Override of the API base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Per-call timeout in seconds
    pub timeout_seconds: u64,
}

impl RemoteProviderConfig {
    const fn with_timeout(timeout_seconds: u64) -> Self {
        Self {
            enabled: true,
            api_key: None,
            base_url: None,
            timeout_seconds,
        }
    }

    /// Per-call timeout as a duration.
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for RemoteProviderConfig {
    fn default() -> Self {
        Self::with_timeout(30)
    }
}

/// The local Ollama daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalProviderConfig {
    /// Whether the daemon is registered at all
    pub enabled: bool,
    /// Daemon address
    pub base_url: String,
    /// Per-call timeout in seconds
    pub timeout_seconds: u64,
}

impl LocalProviderConfig {
    /// Per-call timeout as a duration.
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for LocalProviderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: relay_local::DEFAULT_OLLAMA_URL.to_owned(),
            timeout_seconds: 60,
        }
    }
}

/// Generation defaults.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Output length when a request leaves it unset
    pub max_tokens: u32,
    /// Temperature when a request leaves it unset
    pub temperature: f32,
}

impl GenerationConfig {
    /// Defaults as generation options.
    pub const fn options(&self) -> GenerationOptions {
        GenerationOptions {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Image pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Whether image intent is handed to the pipeline
    pub enabled: bool,
    /// Catalog key of the default model
    pub model: String,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Diffusion step count
    pub num_inference_steps: u32,
    /// Classifier-free guidance strength
    pub guidance_scale: f32,
    /// Pipeline call timeout in seconds
    pub timeout_seconds: u64,
}

impl ImageConfig {
    /// Pipeline call timeout as a duration.
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: DEFAULT_IMAGE_MODEL.to_owned(),
            width: 1024,
            height: 1024,
            num_inference_steps: 50,
            guidance_scale: 7.5,
            timeout_seconds: 120,
        }
    }
}

impl RouterConfig {
    /// Get the default config directory path (`~/.relay`)
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined
    pub fn config_dir() -> Result<PathBuf> {
        use dirs::home_dir;
        let home = home_dir().ok_or_else(|| {
            RoutingError::Configuration("Could not determine home directory".to_owned())
        })?;
        Ok(home.join(".relay"))
    }

    /// Get the default config file path (`~/.relay/config.toml`)
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from the default location, creating it with default
    /// values if it doesn't exist
    ///
    /// # Errors
    /// Returns an error if the config cannot be read or created
    pub fn load_or_create() -> Result<Self> {
        Self::load_or_create_at(&Self::config_path()?)
    }

    /// Load config from `path`, creating it with default values if missing
    ///
    /// # Errors
    /// Returns an error if the config cannot be read or created
    pub fn load_or_create_at(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            let config = Self::default();
            config.save_to_file(path)?;
            tracing::info!("Created default configuration at {}", path.display());
            Ok(config)
        }
    }

    /// Load config from a specific file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn load_from_file(path: &Path) -> Result<Self> {
        use toml::from_str;
        let contents = fs::read_to_string(path).map_err(|error| {
            RoutingError::Configuration(format!("Failed to read config: {error}"))
        })?;
        from_str(&contents).map_err(|error| {
            RoutingError::Configuration(format!("Failed to parse config: {error}"))
        })
    }

    /// Save config to a specific file
    ///
    /// # Errors
    /// Returns an error if the file cannot be written
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        use toml::to_string_pretty;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|error| {
                RoutingError::Configuration(format!("Failed to create config directory: {error}"))
            })?;
        }

        let contents = to_string_pretty(self).map_err(|error| {
            RoutingError::Configuration(format!("Failed to serialize config: {error}"))
        })?;

        let header = "# Relay Configuration File\n\
                      # This file is automatically generated on first run\n\
                      # API keys may also be supplied through GROQ_API_KEY and HUGGINGFACE_API_KEY\n\n";

        fs::write(path, format!("{header}{contents}")).map_err(|error| {
            RoutingError::Configuration(format!("Failed to write config: {error}"))
        })?;

        Ok(())
    }

    /// Get API key for a provider, checking config first, then environment variables.
    /// Blank values count as absent.
    pub fn get_api_key(&self, provider: &str) -> Option<String> {
        let (configured, env_key) = match provider {
            "groq" => (&self.providers.groq.api_key, ENV_GROQ_API_KEY),
            "huggingface" => (&self.providers.huggingface.api_key, ENV_HUGGINGFACE_API_KEY),
            _ => return None,
        };

        configured
            .clone()
            .or_else(|| env::var(env_key).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = RouterConfig::default();
        assert!(config.providers.groq.enabled);
        assert_eq!(config.providers.groq.timeout(), Duration::from_secs(30));
        assert_eq!(config.providers.huggingface.timeout_seconds, 60);
        assert_eq!(config.providers.ollama.base_url, "http://localhost:11434");
        assert_eq!(config.generation.max_tokens, 1000);
        assert_eq!(config.image.timeout_seconds, 120);
        assert!(config.routing_table.is_none());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: RouterConfig = match toml::from_str(
            "[providers.groq]\napi_key = \"gsk_test\"\n\n[generation]\ntemperature = 0.2\n",
        ) {
            Ok(config) => config,
            Err(error) => panic!("parse failed: {error}"),
        };

        assert_eq!(config.get_api_key("groq").as_deref(), Some("gsk_test"));
        assert_eq!(config.providers.groq.timeout_seconds, 30);
        assert!((config.generation.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.generation.max_tokens, 1000);
    }

    #[test]
    fn test_unknown_provider_has_no_key() {
        assert!(RouterConfig::default().get_api_key("openai").is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = match TempDir::new() {
            Ok(dir) => dir,
            Err(error) => panic!("tempdir failed: {error}"),
        };
        let path = dir.path().join("nested").join("config.toml");

        let created = match RouterConfig::load_or_create_at(&path) {
            Ok(config) => config,
            Err(error) => panic!("create failed: {error}"),
        };
        assert!(path.exists());

        let contents = fs::read_to_string(&path).unwrap_or_default();
        assert!(contents.starts_with("# Relay Configuration File"));

        let mut edited = created;
        edited.providers.ollama.enabled = false;
        edited.routing_table = Some(PathBuf::from("/etc/relay/table.toml"));
        if let Err(error) = edited.save_to_file(&path) {
            panic!("save failed: {error}");
        }

        let reloaded = match RouterConfig::load_from_file(&path) {
            Ok(config) => config,
            Err(error) => panic!("reload failed: {error}"),
        };
        assert!(!reloaded.providers.ollama.enabled);
        assert_eq!(
            reloaded.routing_table,
            Some(PathBuf::from("/etc/relay/table.toml"))
        );
    }

    #[test]
    fn test_invalid_file_is_configuration_error() {
        let dir = match TempDir::new() {
            Ok(dir) => dir,
            Err(error) => panic!("tempdir failed: {error}"),
        };
        let path = dir.path().join("config.toml");
        if let Err(error) = fs::write(&path, "providers = 3") {
            panic!("write failed: {error}");
        }

        assert!(matches!(
            RouterConfig::load_from_file(&path),
            Err(RoutingError::Configuration(_))
        ));
    }
}
