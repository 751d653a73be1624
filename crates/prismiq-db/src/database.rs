//! LanceDB connection and table management.

use std::path::Path;

use arrow_array::RecordBatchIterator;
use lancedb::connection::Connection;
use tracing::info;

use crate::error::Result;
use crate::schema::TABLE_ANALYSES;
use crate::schema_arrow::analysis_schema;

/// Main database handle.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
    path: String,
}

impl Database {
    /// Open or create a database at the specified directory.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        if !path.as_ref().exists() {
            std::fs::create_dir_all(path.as_ref())?;
        }

        let conn = lancedb::connect(&path_str).execute().await?;
        Ok(Self { conn, path: path_str })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Create missing tables. Existing tables are left untouched.
    pub async fn initialize(&self) -> Result<()> {
        if !self.table_exists(TABLE_ANALYSES).await? {
            let schema = analysis_schema();
            let empty = RecordBatchIterator::new(vec![], schema.clone());
            self.conn.create_table(TABLE_ANALYSES, empty).execute().await?;
            info!(path = %self.path, table = TABLE_ANALYSES, "created table");
        }
        Ok(())
    }

    pub async fn table_exists(&self, name: &str) -> Result<bool> {
        let tables = self.conn.table_names().execute().await?;
        Ok(tables.iter().any(|t| t == name))
    }
}
