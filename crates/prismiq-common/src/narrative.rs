//! Text-generation seam used for the narrative explanations.
//!
//! The orchestrator only depends on this trait; concrete LLM backends live in
//! `prismiq-llm`. Failures are never fatal: callers substitute a placeholder.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("text generation is not configured")]
    Unconfigured,
    #[error("text generation failed: {0}")]
    Failed(String),
    #[error("text generation returned no content")]
    Empty,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate free text for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, NarrativeError>;

    /// Short identifier for logs.
    fn name(&self) -> &str;
}

/// Generator used when no LLM provider is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, NarrativeError> {
        Err(NarrativeError::Unconfigured)
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_generator_reports_unconfigured() {
        let err = DisabledGenerator.generate("hello").await.unwrap_err();
        assert!(matches!(err, NarrativeError::Unconfigured));
    }
}
