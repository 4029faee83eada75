//! Configuration for Machina
//!
//! Every tunable the bridge needs is gathered into one [`Config`] value at
//! process entry: defaults, then the optional JSON file, then environment,
//! then command-line flags. The result is passed down by reference and never
//! mutated afterwards.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

pub mod paths;

pub use paths::{config_path, data_dir, expand_home, install_dir};

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config file not found: {0:?}")]
    NotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Name of the prompt document, both in the remote repository and next to the binary
pub const PROMPT_FILE_NAME: &str = "machina.yaml";

/// Completion provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking_budget: Option<u32>,
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            thinking_budget: None,
            timeout_secs: default_provider_timeout(),
        }
    }
}

fn default_model() -> String {
    "claude-sonnet-4-5".to_string()
}

fn default_max_tokens() -> u32 {
    16000
}

fn default_provider_timeout() -> u64 {
    300
}

/// GitHub account used to reach the prompt repository
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default = "default_github_timeout")]
    pub timeout_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            name: String::new(),
            email: String::new(),
            api_base: None,
            timeout_secs: default_github_timeout(),
        }
    }
}

fn default_github_timeout() -> u64 {
    10
}

/// How remote prompt documents are reused across invocations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CachePolicy {
    /// Fetch and parse on every invocation
    #[default]
    None,
    /// Reuse the parsed prompt while the remote revision is unchanged
    Revision,
}

/// Where the system prompt lives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    #[serde(default = "default_organization")]
    pub organization: String,
    #[serde(default = "default_repository")]
    pub repository: String,
    #[serde(default = "default_prompt_path")]
    pub path: String,
    #[serde(default = "default_private")]
    pub private: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
    #[serde(default)]
    pub cache: CachePolicy,
    #[serde(default = "default_cache_max_age")]
    pub cache_max_age_secs: u64,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            organization: default_organization(),
            repository: default_repository(),
            path: default_prompt_path(),
            private: default_private(),
            local_path: None,
            cache: CachePolicy::default(),
            cache_max_age_secs: default_cache_max_age(),
        }
    }
}

fn default_organization() -> String {
    "machine-name".to_string()
}

fn default_repository() -> String {
    "machine_name".to_string()
}

fn default_prompt_path() -> String {
    PROMPT_FILE_NAME.to_string()
}

fn default_private() -> bool {
    true
}

fn default_cache_max_age() -> u64 {
    300
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
}

impl Config {
    /// Load from the default location
    pub async fn load() -> Result<Self> {
        let path = config_path();
        Self::load_from(&path).await
    }

    /// Load from a specific location, falling back to defaults when absent
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("no config at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        info!("loading config from {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load from a location the user named explicitly; absence is an error
    pub async fn load_required(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        Self::load_from(path).await
    }

    /// Overlay values from the process environment
    pub fn with_process_env(self) -> Self {
        self.with_env(|key| std::env::var(key).ok())
    }

    /// Overlay values from an environment lookup
    ///
    /// Empty values are ignored so an exported-but-blank variable does not
    /// erase a value from the config file.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get("PROVIDER_API_KEY") {
            self.provider.api_key = v;
        }
        if let Some(v) = get("MACHINA_PROVIDER_API_BASE") {
            self.provider.api_base = Some(v);
        }
        if let Some(v) = get("MACHINA_MODEL") {
            self.provider.model = v;
        }
        if let Some(v) = get("GITHUB_TOKEN") {
            self.github.token = v;
        }
        if let Some(v) = get("GITHUB_NAME") {
            self.github.name = v;
        }
        if let Some(v) = get("GITHUB_EMAIL") {
            self.github.email = v;
        }
        if let Some(v) = get("MACHINA_GITHUB_API_BASE") {
            self.github.api_base = Some(v);
        }
        if let Some(v) = get("MACHINA_PROMPT_FILE") {
            self.prompt.local_path = Some(v);
        }
        self
    }

    /// Provider endpoint
    pub fn provider_api_base(&self) -> String {
        self.provider
            .api_base
            .clone()
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| "https://api.anthropic.com".to_string())
    }

    /// GitHub REST endpoint
    pub fn github_api_base(&self) -> String {
        self.github
            .api_base
            .clone()
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| "https://api.github.com".to_string())
    }

    /// Local fallback prompt document
    pub fn local_prompt_path(&self) -> PathBuf {
        match &self.prompt.local_path {
            Some(path) if !path.is_empty() => expand_home(path),
            _ => install_dir().join(PROMPT_FILE_NAME),
        }
    }

    pub fn has_provider_key(&self) -> bool {
        !self.provider.api_key.is_empty()
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider.timeout_secs)
    }

    pub fn github_timeout(&self) -> Duration {
        Duration::from_secs(self.github.timeout_secs)
    }

    pub fn cache_max_age(&self) -> Duration {
        Duration::from_secs(self.prompt.cache_max_age_secs)
    }
}
