pub mod json_dir;
pub mod memory;
pub mod record;

pub use json_dir::JsonDirStore;
pub use memory::MemoryStore;
pub use record::{ClassificationRecord, StoredDocument};

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Document {0} has no classification and cannot be stored")]
    Unclassified(String),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Keyed blob store of classified documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Write (or overwrite) a record.
    async fn put(&self, record: &StoredDocument) -> Result<(), StoreError>;

    /// All readable records.
    async fn list(&self) -> Result<Vec<StoredDocument>, StoreError>;

    async fn get(&self, document_id: &str) -> Result<StoredDocument, StoreError> {
        self.list()
            .await?
            .into_iter()
            .find(|record| record.document_id == document_id)
            .ok_or_else(|| StoreError::NotFound(document_id.to_string()))
    }

    /// Lookup by original filename, ignoring case.
    async fn find_by_filename(&self, filename: &str) -> Result<StoredDocument, StoreError> {
        let wanted = filename.to_lowercase();
        self.list()
            .await?
            .into_iter()
            .find(|record| record.filename.to_lowercase() == wanted)
            .ok_or_else(|| StoreError::NotFound(filename.to_string()))
    }
}
