//! Backend selection from configuration.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::backend::{GeminiBackend, LlmBackend, LlmError, OllamaBackend, OpenAiCompatibleBackend};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    Gemini,
    Ollama,
    OpenaiCompatible,
    None,
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub model: String,
    pub base_url: Option<String>,
    pub api_key: Option<SecretString>,
    pub timeout: Duration,
}

/// Build the configured backend.
///
/// Returns `Ok(None)` when text generation is disabled or the hosted
/// provider has no credential; narration then falls back to placeholders.
pub fn build_backend(config: &BackendConfig) -> Result<Option<Arc<dyn LlmBackend>>, LlmError> {
    let backend: Arc<dyn LlmBackend> = match config.kind {
        BackendKind::None => {
            info!("text generation disabled");
            return Ok(None);
        }
        BackendKind::Gemini => {
            let Some(key) = config.api_key.clone() else {
                warn!("no Gemini API key configured; explanations will use placeholder text");
                return Ok(None);
            };
            let mut backend = GeminiBackend::new(key, &config.model, config.timeout);
            if let Some(url) = &config.base_url {
                backend = backend.with_base_url(url);
            }
            Arc::new(backend)
        }
        BackendKind::Ollama => Arc::new(OllamaBackend::new(
            config.base_url.as_deref().unwrap_or(DEFAULT_OLLAMA_URL),
            &config.model,
            config.timeout,
        )),
        BackendKind::OpenaiCompatible => {
            let url = config.base_url.as_deref().ok_or_else(|| {
                LlmError::Unavailable("openai_compatible provider requires base_url".to_string())
            })?;
            Arc::new(OpenAiCompatibleBackend::new(
                url,
                &config.model,
                config.api_key.clone(),
                config.timeout,
            ))
        }
    };

    info!(backend = backend.backend_name(), model = backend.model_id(), "LLM backend ready");
    Ok(Some(backend))
}
