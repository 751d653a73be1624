//! prismiq-db: persistence of classification requests.
//!
//! Records live in a single LanceDB table; [`InMemoryAnalysisStore`] stands
//! in for it in tests and ephemeral deployments. Both sit behind
//! [`AnalysisStore`].

pub mod analyses;
pub mod database;
pub mod error;
pub mod schema;
pub mod schema_arrow;
pub mod store;

pub use analyses::AnalysisRepository;
pub use database::Database;
pub use error::{DbError, Result};
pub use schema::{AnalysisRecord, NewAnalysis, TABLE_ANALYSES};
pub use store::{AnalysisStore, InMemoryAnalysisStore};
