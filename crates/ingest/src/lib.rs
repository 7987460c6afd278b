pub mod document;
pub mod label;
pub mod reader;

pub use document::Document;
pub use label::{Label, UnknownLabel};
pub use reader::FileReader;

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use unicode_segmentation::UnicodeSegmentation;

/// Ground truth for documents whose filename carries no label prefix.
pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("unsupported file format: {0:?}")]
    UnsupportedFormat(String),

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Ground-truth label from the filename convention: the leading run of
/// letters, capitalized ("invoice_03.txt" -> "Invoice").
pub fn true_label_from_filename(filename: &str) -> String {
    let mut prefix = filename.chars().take_while(|c| c.is_alphabetic());
    match prefix.next() {
        Some(first) => first
            .to_uppercase()
            .chain(prefix.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => UNKNOWN_LABEL.to_string(),
    }
}

/// Load one text file as a Document. Returns `Ok(None)` for empty files.
pub async fn load_file(path: &Path) -> Result<Option<Document>, LoadError> {
    let text = FileReader::read_file(path).await?;
    if text.is_empty() {
        return Ok(None);
    }

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut metadata = Map::new();
    metadata.insert(
        "num_words".to_string(),
        Value::from(text.unicode_words().count()),
    );

    let document = Document::new(filename.clone(), text)
        .with_true_label(true_label_from_filename(&filename))
        .with_metadata(metadata);
    Ok(Some(document))
}

/// Load every supported file under `dir`. Unreadable and empty files are
/// skipped with a warning.
pub async fn load_directory(dir: &Path) -> Result<Vec<Document>, LoadError> {
    let mut documents = Vec::new();

    for path in FileReader::list_directory(dir)? {
        match load_file(&path).await {
            Ok(Some(doc)) => documents.push(doc),
            Ok(None) => tracing::warn!(path = %path.display(), "Skipping empty document"),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable document"),
        }
    }

    tracing::info!(dir = %dir.display(), count = documents.len(), "Loaded documents");
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_true_label_from_filename() {
        assert_eq!(true_label_from_filename("invoice_03.txt"), "Invoice");
        assert_eq!(true_label_from_filename("CONTRACT-7.txt"), "Contract");
        assert_eq!(true_label_from_filename("Earnings.md"), "Earnings");
        assert_eq!(true_label_from_filename("2024_report.txt"), "Unknown");
        assert_eq!(true_label_from_filename(""), "Unknown");
    }

    #[tokio::test]
    async fn test_load_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("invoice_1.txt"), "Invoice #1\nAmount due: $500").unwrap();
        std::fs::write(dir.path().join("contract_1.md"), "  Service agreement  \n").unwrap();
        std::fs::write(dir.path().join("empty.txt"), "   ").unwrap();
        std::fs::write(dir.path().join("scan.pdf"), "%PDF").unwrap();

        let docs = load_directory(dir.path()).await.unwrap();
        assert_eq!(docs.len(), 2);

        let contract = docs.iter().find(|d| d.filename() == "contract_1.md").unwrap();
        assert_eq!(contract.raw_text(), "Service agreement");
        assert_eq!(contract.true_label(), Some("Contract"));
        assert_eq!(contract.metadata()["num_words"], Value::from(2));
        assert!(!contract.is_classified());
    }

    #[tokio::test]
    async fn test_load_directory_rejects_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("invoice.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(matches!(
            load_directory(&file).await,
            Err(LoadError::NotADirectory(_))
        ));
    }
}
