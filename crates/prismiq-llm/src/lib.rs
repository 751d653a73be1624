//! prismiq-llm: LLM backends behind the narrative [`prismiq_common::TextGenerator`].

pub mod audit;
pub mod backend;
pub mod factory;
pub mod narrator;

pub use backend::{LlmBackend, LlmError, LlmRequest, LlmResponse, Message};
pub use factory::{build_backend, BackendConfig, BackendKind};
pub use narrator::LlmNarrator;
