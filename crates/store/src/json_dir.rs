use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::{DocumentStore, StoreError, StoredDocument};

/// One pretty-printed JSON file per document in a single directory.
///
/// Lookups scan the directory, so records written by other processes are
/// visible without a restart.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
        move |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    async fn json_files(&self) -> Result<Vec<PathBuf>, StoreError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            // Nothing written yet.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Self::io_error(&self.dir)(e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(Self::io_error(&self.dir))? {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl DocumentStore for JsonDirStore {
    async fn put(&self, record: &StoredDocument) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(Self::io_error(&self.dir))?;

        let path = self.dir.join(record.storage_key());
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&path, json).await.map_err(Self::io_error(&path))?;

        tracing::debug!(document_id = %record.document_id, path = %path.display(), "Stored document");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<StoredDocument>, StoreError> {
        let mut records = Vec::new();

        for path in self.json_files().await? {
            let text = match fs::read_to_string(&path).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable record");
                    continue;
                }
            };
            match serde_json::from_str::<StoredDocument>(&text) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping malformed record"),
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClassificationRecord;
    use ingest::Label;
    use serde_json::{json, Map};

    fn record(id: &str, filename: &str, label: Label) -> StoredDocument {
        let mut metadata = Map::new();
        metadata.insert("vendor".into(), json!("Acme"));
        StoredDocument {
            document_id: id.to_string(),
            filename: filename.to_string(),
            raw_text: "text".to_string(),
            classification: ClassificationRecord { label, confidence: 0.9 },
            metadata,
        }
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::new(dir.path().join("output_json"));

        store.put(&record("id-1", "invoice_1.txt", Label::Invoice)).await.unwrap();
        store.put(&record("id-2", "Contract_2.txt", Label::Contract)).await.unwrap();

        assert!(dir.path().join("output_json/invoice_1.json").exists());
        let got = store.get("id-2").await.unwrap();
        assert_eq!(got, record("id-2", "Contract_2.txt", Label::Contract));
        assert_eq!(store.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_find_by_filename_ignores_case() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::new(dir.path());
        store.put(&record("id-1", "Invoice_1.txt", Label::Invoice)).await.unwrap();

        let found = store.find_by_filename("INVOICE_1.TXT").await.unwrap();
        assert_eq!(found.document_id, "id-1");
        assert!(matches!(
            store.find_by_filename("invoice_2.txt").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::new(dir.path().join("never-created"));
        assert_eq!(store.dir(), dir.path().join("never-created"));
        assert!(store.list().await.unwrap().is_empty());
        assert!(matches!(store.get("nope").await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_malformed_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::new(dir.path());
        store.put(&record("id-1", "earnings_q1.txt", Label::Earnings)).await.unwrap();
        std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let records = store.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].document_id, "id-1");
    }
}
