//! Offline evaluation of classification runs and stored metadata.

pub mod confusion;
pub mod plots;
pub mod report;
pub mod validate;

pub use confusion::ConfusionMatrix;
pub use plots::generate_confusion_plot;
pub use report::{AverageMetrics, ClassMetrics, ClassificationReport};
pub use validate::{ValidationError, ValidationReport, missing_fields, validate_metadata, validate_store};

use ingest::Document;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub matrix: ConfusionMatrix,
    pub report: ClassificationReport,
    pub evaluated: usize,
    /// Documents lacking a true or a predicted label.
    pub skipped: usize,
}

/// Compare predicted against true labels. Documents are not modified.
pub fn evaluate(documents: &[Document]) -> Evaluation {
    let pairs: Vec<(String, String)> = documents
        .iter()
        .filter_map(|doc| {
            let actual = doc.true_label()?;
            let predicted = doc.predicted_label()?;
            Some((actual.to_string(), predicted.to_string()))
        })
        .collect();

    let skipped = documents.len() - pairs.len();
    if skipped > 0 {
        tracing::warn!(skipped, "Skipping documents without both labels");
    }

    let matrix = ConfusionMatrix::from_pairs(&pairs);
    let report = ClassificationReport::from_matrix(&matrix);
    tracing::info!(
        evaluated = pairs.len(),
        accuracy = report.accuracy,
        "Evaluation finished"
    );

    Evaluation {
        matrix,
        report,
        evaluated: pairs.len(),
        skipped,
    }
}
