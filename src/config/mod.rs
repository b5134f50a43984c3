//! Agent configuration (layered: code > env / `.env` > TOML file > defaults).

use std::fmt;
use std::path::Path;
use std::time::Duration;

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_ITERATIONS: usize = 5;
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_SEARCH_RESULTS: usize = 5;

const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Settings consumed by the agent, the oracle, and the built-in tools.
///
/// `verbose` only affects logging. `model` is passed through to the oracle
/// untouched.
#[derive(Clone, Builder, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentConfig {
    #[builder(into, default = DEFAULT_MODEL.to_string())]
    pub model: String,
    #[builder(default = DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: usize,
    #[builder(default)]
    pub verbose: bool,
    #[builder(into)]
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    #[builder(into, default = DEFAULT_BASE_URL.to_string())]
    pub base_url: String,
    #[builder(default = DEFAULT_ORACLE_TIMEOUT_SECS)]
    pub oracle_timeout_secs: u64,
    #[builder(default = DEFAULT_SEARCH_TIMEOUT_SECS)]
    pub search_timeout_secs: u64,
    #[builder(default = DEFAULT_MAX_SEARCH_RESULTS)]
    pub max_search_results: usize,
    /// Replaces the built-in system directive when set.
    #[builder(into)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("model", &self.model)
            .field("max_iterations", &self.max_iterations)
            .field("verbose", &self.verbose)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("oracle_timeout_secs", &self.oracle_timeout_secs)
            .field("search_timeout_secs", &self.search_timeout_secs)
            .field("max_search_results", &self.max_search_results)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .finish()
    }
}

impl AgentConfig {
    /// Defaults overlaid with environment variables (after loading `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::default().merge_env()
    }

    /// Load a TOML file. Missing keys fall back to defaults.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Overlay process environment variables onto this config.
    pub fn merge_env(self) -> Result<Self, ConfigError> {
        self.merge_lookup(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary key lookup. Unset keys keep the
    /// current value; set-but-unparseable keys are an error.
    pub fn merge_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(model) = lookup("MODEL_NAME").filter(|m| !m.trim().is_empty()) {
            self.model = model;
        }
        if let Some(url) = lookup("OPENAI_BASE_URL").filter(|u| !u.trim().is_empty()) {
            self.base_url = url;
        }
        if let Some(raw) = lookup("MAX_ITERATIONS") {
            self.max_iterations = parse_number("MAX_ITERATIONS", &raw)?;
        }
        if let Some(raw) = lookup("ORACLE_TIMEOUT_SECS") {
            self.oracle_timeout_secs = parse_number("ORACLE_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = lookup("SEARCH_TIMEOUT_SECS") {
            self.search_timeout_secs = parse_number("SEARCH_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = lookup("AGENT_VERBOSE") {
            self.verbose = matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::Invalid("max_iterations must be at least 1".into()));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model must not be empty".into()));
        }
        if self.oracle_timeout_secs == 0 || self.search_timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be at least 1 second".into()));
        }
        if self.max_search_results == 0 {
            return Err(ConfigError::Invalid("max_search_results must be at least 1".into()));
        }
        Ok(())
    }

    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or(ConfigError::MissingApiKey(API_KEY_ENV))
    }

    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{key} must be a non-negative integer, got '{raw}'")))
}
