use extract::schema_fields;
use ingest::Label;
use serde_json::{Map, Value};
use std::fmt;
use store::{DocumentStore, StoreError, StoredDocument};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{label} document is missing required fields: {}", fields.join(", "))]
    MissingFields { label: Label, fields: Vec<String> },
}

/// Schema fields of `label` that are absent, null, or empty.
pub fn missing_fields(label: Label, metadata: &Map<String, Value>) -> Vec<String> {
    schema_fields(label)
        .iter()
        .filter(|field| is_blank(metadata.get(**field)))
        .map(|field| field.to_string())
        .collect()
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
        Some(_) => false,
    }
}

pub fn validate_metadata(label: Label, metadata: &Map<String, Value>) -> Result<(), ValidationError> {
    let fields = missing_fields(label, metadata);
    if fields.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingFields { label, fields })
    }
}

/// Completeness of one stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub document_id: String,
    pub filename: String,
    pub label: Label,
    pub missing: Vec<String>,
}

impl ValidationReport {
    pub fn for_record(record: &StoredDocument) -> Self {
        Self {
            document_id: record.document_id.clone(),
            filename: record.filename.clone(),
            label: record.classification.label,
            missing: missing_fields(record.classification.label, &record.metadata),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} [{}]", self.filename, self.label)?;
        if self.is_complete() {
            writeln!(f, "All required fields are present.")
        } else {
            writeln!(f, "Missing required fields: {}", self.missing.join(", "))
        }
    }
}

/// Check every stored record. Never modifies the store.
pub async fn validate_store(store: &dyn DocumentStore) -> Result<Vec<ValidationReport>, StoreError> {
    let records = store.list().await?;
    let reports: Vec<ValidationReport> = records.iter().map(ValidationReport::for_record).collect();

    let incomplete = reports.iter().filter(|r| !r.is_complete()).count();
    tracing::info!(
        documents = reports.len(),
        incomplete,
        "Metadata validation finished"
    );

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use store::{ClassificationRecord, MemoryStore};

    fn meta(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_complete_invoice() {
        let metadata = meta(json!({
            "vendor": "Acme",
            "amount": "100.00",
            "due_date": "2025-06-01",
            "line_items": [{"description": "Widget", "amount": "100.00"}]
        }));
        assert_eq!(validate_metadata(Label::Invoice, &metadata), Ok(()));
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let metadata = meta(json!({
            "parties": [],
            "effective_date": "",
            "termination_date": null,
            "key_terms": ["Net 30"]
        }));
        let err = validate_metadata(Label::Contract, &metadata).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingFields {
                label: Label::Contract,
                fields: vec!["parties".into(), "effective_date".into(), "termination_date".into()],
            }
        );
        assert_eq!(
            err.to_string(),
            "Contract document is missing required fields: parties, effective_date, termination_date"
        );
    }

    #[test]
    fn test_empty_metrics_missing() {
        let metadata = meta(json!({
            "reporting_period": "Q1 2024",
            "key_metrics": {},
            "executive_summary": "Strong quarter"
        }));
        assert_eq!(missing_fields(Label::Earnings, &metadata), vec!["key_metrics"]);
    }

    #[tokio::test]
    async fn test_validate_store_reports_each_record() {
        let store = MemoryStore::new();
        for (id, filename, metadata) in [
            ("a", "Invoice_1.txt", json!({"vendor": "Acme", "amount": "5", "due_date": "2025-01-01", "line_items": [1]})),
            ("b", "Invoice_2.txt", json!({"vendor": "Acme"})),
        ] {
            store
                .put(&StoredDocument {
                    document_id: id.into(),
                    filename: filename.into(),
                    raw_text: String::new(),
                    classification: ClassificationRecord {
                        label: Label::Invoice,
                        confidence: 0.9,
                    },
                    metadata: meta(metadata),
                })
                .await
                .unwrap();
        }

        let reports = validate_store(&store).await.unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports[0].is_complete());
        assert_eq!(reports[1].missing, vec!["amount", "due_date", "line_items"]);
        assert!(reports[1].to_string().contains("Missing required fields: amount"));
        // Report-only: the store is unchanged.
        assert_eq!(store.len(), 2);
    }
}
