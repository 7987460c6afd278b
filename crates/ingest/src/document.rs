use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::label::Label;

/// An in-memory business document moving through the pipeline.
///
/// Identity, filename and text are fixed at construction. The classifier
/// fills `predicted_label`/`label_confidence`, the extractor merges into
/// `metadata`.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    id: String,
    filename: String,
    raw_text: String,
    true_label: Option<String>,
    predicted_label: Option<Label>,
    label_confidence: BTreeMap<Label, f64>,
    metadata: Map<String, Value>,
}

impl Document {
    pub fn new(filename: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            filename: filename.into(),
            raw_text: raw_text.into(),
            true_label: None,
            predicted_label: None,
            label_confidence: BTreeMap::new(),
            metadata: Map::new(),
        }
    }

    /// Rebuild a classified document from its persisted form.
    pub fn restore(
        id: impl Into<String>,
        filename: impl Into<String>,
        raw_text: impl Into<String>,
        label: Label,
        confidence: f64,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            id: id.into(),
            filename: filename.into(),
            raw_text: raw_text.into(),
            true_label: None,
            predicted_label: Some(label),
            label_confidence: BTreeMap::from([(label, confidence)]),
            metadata,
        }
    }

    pub fn with_true_label(mut self, label: impl Into<String>) -> Self {
        self.true_label = Some(label.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn true_label(&self) -> Option<&str> {
        self.true_label.as_deref()
    }

    pub fn predicted_label(&self) -> Option<Label> {
        self.predicted_label
    }

    pub fn label_confidence(&self) -> &BTreeMap<Label, f64> {
        &self.label_confidence
    }

    /// Confidence of the predicted label, 0.0 when unclassified.
    pub fn confidence(&self) -> f64 {
        self.predicted_label
            .and_then(|label| self.label_confidence.get(&label).copied())
            .unwrap_or(0.0)
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn is_classified(&self) -> bool {
        self.predicted_label.is_some()
    }

    /// Record the classifier's verdict. Only the predicted label's
    /// confidence is kept.
    pub fn set_classification(&mut self, label: Label, confidence: f64) {
        self.predicted_label = Some(label);
        self.label_confidence = BTreeMap::from([(label, confidence)]);
    }

    /// Merge extracted fields into the metadata; incoming keys overwrite,
    /// all other keys are left untouched.
    pub fn merge_metadata(&mut self, fields: Map<String, Value>) {
        for (key, value) in fields {
            self.metadata.insert(key, value);
        }
    }
}
