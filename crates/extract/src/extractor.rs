use ingest::{Document, Label};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::error::ExtractionFailure;
use crate::llm::{CompletionOptions, LanguageModel};
use crate::prompt::build_extraction_prompt;
use crate::schema::ExtractedMetadata;

/// Fills a classified document's metadata using the template bound to its
/// label. Date normalization is left to the template; no date arithmetic
/// happens here.
#[derive(Clone)]
pub struct MetadataExtractor {
    model: Arc<dyn LanguageModel>,
}

impl MetadataExtractor {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Run extraction for `label` over the full text.
    pub async fn extract_text(&self, label: Label, text: &str) -> Result<ExtractedMetadata, ExtractionFailure> {
        let value = self.complete_json(label, text).await?;
        Ok(ExtractedMetadata::parse(label, value)?)
    }

    async fn complete_json(&self, label: Label, text: &str) -> Result<Value, ExtractionFailure> {
        let prompt = build_extraction_prompt(label, text);
        let completion = self
            .model
            .complete(&prompt, &CompletionOptions::extraction())
            .await?;
        Ok(serde_json::from_str(completion.text.trim())?)
    }

    /// Extract and merge into `document.metadata`. Nothing is merged when
    /// extraction fails.
    ///
    /// Keys the model returned overwrite existing values. Schema keys it
    /// omitted are filled with `null` only when the document has no value
    /// for them yet.
    pub async fn extract(&self, document: &mut Document) -> Result<ExtractedMetadata, ExtractionFailure> {
        let label = document
            .predicted_label()
            .ok_or(ExtractionFailure::Unclassified)?;

        let value = self.complete_json(label, document.raw_text()).await?;
        let returned: Vec<String> = value
            .as_object()
            .map(|object| object.keys().cloned().collect())
            .unwrap_or_default();
        let extracted = ExtractedMetadata::parse(label, value)?;

        let existing = document.metadata();
        let fields: Map<String, Value> = extracted
            .clone()
            .into_fields()
            .into_iter()
            .filter(|(key, _)| returned.contains(key) || !existing.contains_key(key))
            .collect();
        document.merge_metadata(fields);

        tracing::debug!(document_id = %document.id(), label = %label, "Extracted metadata");
        Ok(extracted)
    }
}
