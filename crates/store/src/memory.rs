use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use crate::{DocumentStore, StoreError, StoredDocument};

/// In-process store keyed by document id.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<DashMap<String, StoredDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn put(&self, record: &StoredDocument) -> Result<(), StoreError> {
        self.records.insert(record.document_id.clone(), record.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<StoredDocument>, StoreError> {
        let mut records: Vec<StoredDocument> = self.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(records)
    }

    async fn get(&self, document_id: &str) -> Result<StoredDocument, StoreError> {
        self.records
            .get(document_id)
            .map(|r| r.value().clone())
            .ok_or_else(|| StoreError::NotFound(document_id.to_string()))
    }
}
