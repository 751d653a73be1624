//! HTTP handlers for all routes.

pub mod analyses;
pub mod metrics;
pub mod predict;
pub mod system;
