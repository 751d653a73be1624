//! [`TextGenerator`] over an LLM backend.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use prismiq_common::{NarrativeError, TextGenerator};
use tracing::debug;

use crate::audit::LlmAuditEntry;
use crate::backend::{LlmBackend, LlmRequest, Message};

pub struct LlmNarrator {
    backend: Option<Arc<dyn LlmBackend>>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl LlmNarrator {
    pub fn new(backend: Option<Arc<dyn LlmBackend>>) -> Self {
        Self { backend, max_tokens: None, temperature: None }
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }
}

#[async_trait]
impl TextGenerator for LlmNarrator {
    async fn generate(&self, prompt: &str) -> Result<String, NarrativeError> {
        let backend = self.backend.as_ref().ok_or(NarrativeError::Unconfigured)?;

        let req = LlmRequest {
            messages: vec![Message::user(prompt)],
            model: None,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let started = Instant::now();
        let resp = backend
            .complete(req)
            .await
            .map_err(|e| NarrativeError::Failed(e.to_string()))?;
        let latency_ms = started.elapsed().as_millis() as u64;

        LlmAuditEntry::new(
            &resp.model,
            backend.backend_name(),
            resp.prompt_tokens,
            resp.completion_tokens,
            &resp.content,
            latency_ms,
        )
        .emit();

        let text = resp.content.trim();
        if text.is_empty() {
            debug!(model = %resp.model, "LLM returned empty content");
            return Err(NarrativeError::Empty);
        }
        Ok(text.to_string())
    }

    fn name(&self) -> &str {
        self.backend
            .as_ref()
            .map(|b| b.backend_name())
            .unwrap_or("unconfigured")
    }
}
