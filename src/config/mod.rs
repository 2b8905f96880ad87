//! Configuration system (layered: code > env > config file).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde::Deserialize;

use crate::agent::DEFAULT_MODEL;
use crate::error::BatonError;

/// Completion rounds per run when nothing else is configured: the initial
/// round plus one follow-up after tool execution.
pub const DEFAULT_MAX_TURNS: usize = 2;

/// Capacity of a run's event channel.
pub const DEFAULT_EVENT_BUFFER: usize = 64;

/// Layered configuration for baton.
///
/// Resolution order: values set in code, then environment variables, then
/// the TOML config file.
#[derive(Debug, Clone)]
pub struct BatonConfig {
    api_keys: Arc<RwLock<HashMap<String, String>>>,
    base_urls: Arc<RwLock<HashMap<String, String>>>,
    model: String,
    max_turns: usize,
    event_buffer: usize,
}

impl Default for BatonConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// On-disk shape of `config.toml`.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    model: Option<String>,
    max_turns: Option<usize>,
    event_buffer: Option<usize>,
    #[serde(default)]
    providers: HashMap<String, ProviderSection>,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderSection {
    api_key: Option<String>,
    base_url: Option<String>,
}

impl BatonConfig {
    /// Create config with built-in defaults and no credentials.
    pub fn new() -> Self {
        Self {
            api_keys: Arc::new(RwLock::new(HashMap::new())),
            base_urls: Arc::new(RwLock::new(HashMap::new())),
            model: DEFAULT_MODEL.to_string(),
            max_turns: DEFAULT_MAX_TURNS,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }

    /// Load the default config file (if present), then environment overrides.
    pub fn load() -> Result<Self, BatonError> {
        let mut config = match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::new(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Load from environment variables only (OPENAI_API_KEY, BATON_MODEL, ...).
    pub fn from_env() -> Self {
        let mut config = Self::new();
        config.apply_env();
        config
    }

    /// Load a TOML config file.
    ///
    /// ```toml
    /// model = "gpt-4o-mini"
    /// max_turns = 4
    ///
    /// [providers.openai]
    /// api_key = "sk-..."
    /// base_url = "http://localhost:8080/v1"
    /// ```
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, BatonError> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&source)
    }

    pub fn from_toml_str(source: &str) -> Result<Self, BatonError> {
        let file: ConfigFile = toml::from_str(source)?;
        let mut config = Self::new();
        if let Some(model) = file.model {
            config.model = model;
        }
        if let Some(max_turns) = file.max_turns {
            config.max_turns = max_turns;
        }
        if let Some(event_buffer) = file.event_buffer {
            config.event_buffer = event_buffer;
        }
        for (provider, section) in file.providers {
            if let Some(key) = section.api_key {
                config.set_api_key(&provider, key);
            }
            if let Some(url) = section.base_url {
                config.set_base_url(&provider, url);
            }
        }
        Ok(config)
    }

    fn apply_env(&mut self) {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error

        let env_mappings = [
            ("OPENAI_API_KEY", "openai", true),
            ("OPENAI_BASE_URL", "openai", false),
        ];
        for (env_var, provider, is_key) in env_mappings {
            if let Ok(value) = std::env::var(env_var) {
                if is_key {
                    self.set_api_key(provider, value);
                } else {
                    self.set_base_url(provider, value);
                }
            }
        }

        if let Ok(model) = std::env::var("BATON_MODEL") {
            self.model = model;
        }
        if let Some(max_turns) = env_usize("BATON_MAX_TURNS") {
            self.max_turns = max_turns;
        }
        if let Some(event_buffer) = env_usize("BATON_EVENT_BUFFER") {
            self.event_buffer = event_buffer;
        }
    }

    pub fn set_api_key(&self, provider: &str, key: String) {
        self.api_keys
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(provider.to_string(), key);
    }

    pub fn get_api_key(&self, provider: &str) -> Option<String> {
        self.api_keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(provider)
            .cloned()
    }

    pub fn set_base_url(&self, provider: &str, url: String) {
        self.base_urls
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(provider.to_string(), url);
    }

    pub fn get_base_url(&self, provider: &str) -> Option<String> {
        self.base_urls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(provider)
            .cloned()
    }

    /// Check if a provider has credentials configured.
    pub fn has_credentials(&self, provider: &str) -> bool {
        self.get_api_key(provider).is_some()
    }

    /// Model used when neither the request nor the agent picks one.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn event_buffer(&self) -> usize {
        self.event_buffer
    }

    pub fn with_event_buffer(mut self, event_buffer: usize) -> Self {
        self.event_buffer = event_buffer;
        self
    }
}

/// `config.toml` under the platform config directory.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "baton").map(|dirs| dirs.config_dir().join("config.toml"))
}

fn env_usize(var: &str) -> Option<usize> {
    let raw = std::env::var(var).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var, value = %raw, "ignoring non-numeric environment value");
            None
        }
    }
}
