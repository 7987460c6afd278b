use extract::{ClassificationFailure, Classifier, ExtractionFailure, LanguageModel, MetadataExtractor};
use futures::stream::{self, StreamExt};
use ingest::Document;
use serde::Serialize;
use std::sync::Arc;
use store::{DocumentStore, StoreError, StoredDocument};
use thiserror::Error;

use crate::metrics::{Metrics, TimedOperation};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("classification failed: {0}")]
    Classification(#[from] ClassificationFailure),

    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionFailure),

    #[error("failed to store document: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub stored: usize,
    pub classification_failures: usize,
    pub extraction_failures: usize,
    pub storage_failures: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: &Result<StoredDocument, PipelineError>) {
        self.total += 1;
        match outcome {
            Ok(_) => self.stored += 1,
            Err(PipelineError::Classification(_)) => self.classification_failures += 1,
            Err(PipelineError::Extraction(_)) => self.extraction_failures += 1,
            Err(PipelineError::Store(_)) => self.storage_failures += 1,
        }
    }

    pub fn failed(&self) -> usize {
        self.total - self.stored
    }
}

/// Classify, extract and persist documents.
pub struct Pipeline {
    classifier: Classifier,
    extractor: MetadataExtractor,
    store: Arc<dyn DocumentStore>,
    metrics: Arc<Metrics>,
    max_concurrent: usize,
}

impl Pipeline {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        store: Arc<dyn DocumentStore>,
        metrics: Arc<Metrics>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            classifier: Classifier::new(model.clone()),
            extractor: MetadataExtractor::new(model),
            store,
            metrics,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Run one document through the pipeline. A failed step leaves nothing
    /// persisted for the document.
    pub async fn process_document(&self, document: &mut Document) -> Result<StoredDocument, PipelineError> {
        let timer = TimedOperation::start();
        let classified = self.classifier.classify(document).await;
        self.metrics.record_classify(timer.elapsed(), classified.is_ok());
        classified?;

        let timer = TimedOperation::start();
        let extracted = self.extractor.extract(document).await;
        self.metrics.record_extract(timer.elapsed(), extracted.is_ok());
        extracted?;

        let stored = self.persist(document).await;
        self.metrics.record_store(stored.is_ok());
        stored
    }

    async fn persist(&self, document: &Document) -> Result<StoredDocument, PipelineError> {
        let record = StoredDocument::try_from(document)?;
        self.store.put(&record).await?;
        Ok(record)
    }

    /// Process every document, at most `max_concurrent` at a time. Failures
    /// are logged and counted; the batch always runs to completion.
    ///
    /// Returns the documents (classified where that succeeded) in
    /// completion order.
    pub async fn process_batch(&self, documents: Vec<Document>) -> (Vec<Document>, BatchSummary) {
        let results: Vec<(Document, Result<StoredDocument, PipelineError>)> = stream::iter(documents)
            .map(|mut document| async move {
                let outcome = self.process_document(&mut document).await;
                (document, outcome)
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        let mut summary = BatchSummary::default();
        let mut processed = Vec::with_capacity(results.len());
        for (document, outcome) in results {
            match &outcome {
                Ok(record) => tracing::info!(
                    document_id = %record.document_id,
                    filename = %record.filename,
                    label = %record.classification.label,
                    confidence = record.classification.confidence,
                    "Document processed"
                ),
                Err(e) => tracing::warn!(
                    document_id = %document.id(),
                    filename = %document.filename(),
                    error = %e,
                    "Document failed, continuing with batch"
                ),
            }
            summary.record(&outcome);
            processed.push(document);
        }

        tracing::info!(
            total = summary.total,
            stored = summary.stored,
            failed = summary.failed(),
            "Batch finished"
        );
        (processed, summary)
    }
}
