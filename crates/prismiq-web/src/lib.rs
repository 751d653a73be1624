//! prismiq-web: HTTP API for the classifier.
//! Provides:
//!   - JSON and file-upload classification endpoints
//!   - Stored-analysis explorer, detail and history views
//!   - Live pipeline progress over WebSocket and SSE
//!   - Model metrics pass-through

pub mod atmosphere;
pub mod handlers;
pub mod response;
pub mod router;
pub mod sse;
pub mod state;
pub mod upload;
pub mod ws;

pub use router::build_router;
pub use state::{AppEvent, AppState, SharedState, WebConfig};
