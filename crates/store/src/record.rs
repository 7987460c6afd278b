use ingest::{Document, Label};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::StoreError;

/// Persisted shape of a classified document. Also the query API's wire
/// format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub document_id: String,
    pub filename: String,
    #[serde(default)]
    pub raw_text: String,
    pub classification: ClassificationRecord,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    #[serde(rename = "type")]
    pub label: Label,
    pub confidence: f64,
}

impl StoredDocument {
    /// Key under which the record is written: the source file's stem plus
    /// `.json`, falling back to the document id.
    pub fn storage_key(&self) -> String {
        let stem = Path::new(&self.filename)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.document_id.clone());
        format!("{stem}.json")
    }

    pub fn into_document(self) -> Document {
        Document::restore(
            self.document_id,
            self.filename,
            self.raw_text,
            self.classification.label,
            self.classification.confidence,
            self.metadata,
        )
    }
}

impl TryFrom<&Document> for StoredDocument {
    type Error = StoreError;

    fn try_from(doc: &Document) -> Result<Self, Self::Error> {
        let label = doc
            .predicted_label()
            .ok_or_else(|| StoreError::Unclassified(doc.id().to_string()))?;

        Ok(Self {
            document_id: doc.id().to_string(),
            filename: doc.filename().to_string(),
            raw_text: doc.raw_text().to_string(),
            classification: ClassificationRecord {
                label,
                confidence: doc.confidence(),
            },
            metadata: doc.metadata().clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classified_invoice() -> Document {
        let mut doc = Document::new("Invoice_7.txt", "INVOICE #7");
        doc.set_classification(Label::Invoice, 0.982);
        let mut fields = Map::new();
        fields.insert("vendor".into(), json!("Acme"));
        fields.insert("due_date".into(), json!("2025-06-01"));
        fields.insert("line_items".into(), Value::Null);
        doc.merge_metadata(fields);
        doc
    }

    #[test]
    fn test_wire_shape() {
        let record = StoredDocument::try_from(&classified_invoice()).unwrap();
        let json = serde_json::to_value(&record).unwrap();

        assert!(json["document_id"].is_string());
        assert_eq!(json["filename"], "Invoice_7.txt");
        assert_eq!(json["raw_text"], "INVOICE #7");
        assert_eq!(json["classification"]["type"], "Invoice");
        assert_eq!(json["classification"]["confidence"], 0.982);
        assert_eq!(json["metadata"]["vendor"], "Acme");
    }

    #[test]
    fn test_round_trip_preserves_identity() {
        let doc = classified_invoice();
        let record = StoredDocument::try_from(&doc).unwrap();
        let text = serde_json::to_string_pretty(&record).unwrap();
        let reloaded: StoredDocument = serde_json::from_str(&text).unwrap();
        let restored = reloaded.into_document();

        assert_eq!(restored.id(), doc.id());
        assert_eq!(restored.filename(), doc.filename());
        assert_eq!(restored.predicted_label(), doc.predicted_label());
        assert_eq!(restored.confidence(), doc.confidence());
        assert_eq!(restored.metadata(), doc.metadata());
    }

    #[test]
    fn test_unclassified_document_is_not_persistable() {
        let doc = Document::new("x.txt", "text");
        assert!(matches!(
            StoredDocument::try_from(&doc),
            Err(StoreError::Unclassified(_))
        ));
    }

    #[test]
    fn test_storage_key() {
        let record = StoredDocument::try_from(&classified_invoice()).unwrap();
        assert_eq!(record.storage_key(), "Invoice_7.json");
    }

    #[test]
    fn test_missing_optional_sections_default() {
        let record: StoredDocument = serde_json::from_value(json!({
            "document_id": "abc",
            "filename": "contract.txt",
            "classification": {"type": "Contract", "confidence": 0.5}
        }))
        .unwrap();
        assert!(record.raw_text.is_empty());
        assert!(record.metadata.is_empty());
    }
}
