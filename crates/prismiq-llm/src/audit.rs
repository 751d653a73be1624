//! Audit record for LLM calls, emitted as a structured tracing event.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmAuditEntry {
    pub id: Uuid,
    pub model: String,
    pub backend: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub output_hash: String,
    pub latency_ms: u64,
    pub called_at: chrono::DateTime<Utc>,
}

impl LlmAuditEntry {
    pub fn new(
        model: &str,
        backend: &str,
        prompt_tokens: u32,
        completion_tokens: u32,
        output: &str,
        latency_ms: u64,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(output.as_bytes());
        let output_hash = format!("{:x}", hasher.finalize());

        Self {
            id: Uuid::new_v4(),
            model: model.to_string(),
            backend: backend.to_string(),
            prompt_tokens,
            completion_tokens,
            output_hash,
            latency_ms,
            called_at: Utc::now(),
        }
    }

    pub fn emit(&self) {
        tracing::info!(
            target: "prismiq::llm::audit",
            id = %self.id,
            model = %self.model,
            backend = %self.backend,
            prompt_tokens = self.prompt_tokens,
            completion_tokens = self.completion_tokens,
            output_hash = %self.output_hash,
            latency_ms = self.latency_ms,
            "llm call"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_hash_is_sha256_hex() {
        let entry = LlmAuditEntry::new("gemini-2.0-flash", "gemini", 10, 2, "abc", 42);
        assert_eq!(
            entry.output_hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(entry.latency_ms, 42);
    }
}
