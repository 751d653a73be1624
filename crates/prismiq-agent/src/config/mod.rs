//! Configuration loading for Prismiq.
//! Reads prismiq.toml from the current directory or the path in the
//! PRISMIQ_CONFIG env var. Every field has a default, so a missing file
//! yields a runnable configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use prismiq_llm::{BackendConfig, BackendKind};
use secrecy::SecretString;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_explorer_poll_secs")]
    pub explorer_poll_secs: u64,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_bind()               -> String { "0.0.0.0:8000".to_string() }
fn default_explorer_poll_secs() -> u64    { 2 }
fn default_max_upload_bytes()   -> usize  { 5 * 1024 * 1024 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            explorer_poll_secs: default_explorer_poll_secs(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "default_koi_model")]
    pub koi_model_path: PathBuf,
    #[serde(default = "default_planet_model")]
    pub planet_model_path: PathBuf,
    /// JSON `{"f0": weight, ...}` exported alongside the KOI model.
    #[serde(default)]
    pub koi_importance_path: Option<PathBuf>,
    #[serde(default = "default_reference_stats")]
    pub reference_stats_path: PathBuf,
    #[serde(default = "default_koi_metrics")]
    pub koi_metrics_path: PathBuf,
    #[serde(default = "default_planet_metrics")]
    pub planet_metrics_path: PathBuf,
    /// Overrides the built-in archetype table.
    #[serde(default)]
    pub archetypes_path: Option<PathBuf>,
}

fn default_koi_model()       -> PathBuf { PathBuf::from("models_store/koi_classifier.onnx") }
fn default_planet_model()    -> PathBuf { PathBuf::from("models_store/planet_classifier.onnx") }
fn default_reference_stats() -> PathBuf { PathBuf::from("models_store/feature_stats.json") }
fn default_koi_metrics()     -> PathBuf { PathBuf::from("models_store/koi_model_metrics.json") }
fn default_planet_metrics()  -> PathBuf { PathBuf::from("models_store/planet_model_metrics.json") }

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            koi_model_path: default_koi_model(),
            planet_model_path: default_planet_model(),
            koi_importance_path: None,
            reference_stats_path: default_reference_stats(),
            koi_metrics_path: default_koi_metrics(),
            planet_metrics_path: default_planet_metrics(),
            archetypes_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: BackendKind,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<SecretString>,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

fn default_llm_model()        -> String { "gemini-2.0-flash".to_string() }
fn default_llm_timeout_secs() -> u64    { 30 }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: BackendKind::default(),
            model: default_llm_model(),
            base_url: None,
            api_key: None,
            timeout_secs: default_llm_timeout_secs(),
            max_tokens: None,
            temperature: None,
        }
    }
}

/// Environment variables consulted, in order, when `llm.api_key` is unset.
pub const API_KEY_ENV_VARS: [&str; 2] = ["PRISMIQ_LLM_API_KEY", "GEMINI_API_KEY"];

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Fill `api_key` from the first non-empty variable returned by `lookup`.
    pub fn resolve_api_key(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_some() {
            return;
        }
        self.api_key = API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .find(|v| !v.trim().is_empty())
            .map(SecretString::from);
    }

    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            kind: self.provider,
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            timeout: self.timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub in_memory: bool,
}

fn default_db_path() -> PathBuf { PathBuf::from("./data/prismiq.lance") }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_db_path(), in_memory: false }
    }
}


impl Config {
    /// Load configuration from prismiq.toml.
    /// Checks PRISMIQ_CONFIG env var first, then the current directory.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("PRISMIQ_CONFIG").unwrap_or_else(|_| "prismiq.toml".to_string());

        let mut config = if Path::new(&path).exists() {
            Self::load_from(&path)?
        } else {
            tracing::warn!(%path, "config file not found; using built-in defaults");
            Self::default()
        };
        config.llm.resolve_api_key(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn load_from(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("invalid config in {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
