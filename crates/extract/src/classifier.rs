use ingest::{Document, Label};
use std::sync::Arc;

use crate::error::ClassificationFailure;
use crate::llm::{CompletionOptions, LanguageModel};
use crate::prompt::build_classification_prompt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationResult {
    pub label: Label,
    /// Joint probability of the emitted tokens, rounded to 3 decimals.
    pub confidence: f64,
}

impl ClassificationResult {
    pub fn apply_to(&self, document: &mut Document) {
        document.set_classification(self.label, self.confidence);
    }
}

/// Assigns a label and a confidence to raw text.
///
/// No thresholding happens here: a low-confidence but well-formed label is
/// still a successful classification.
#[derive(Clone)]
pub struct Classifier {
    model: Arc<dyn LanguageModel>,
}

impl Classifier {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Classify a document's text without touching the document.
    pub async fn classify_text(&self, text: &str) -> Result<ClassificationResult, ClassificationFailure> {
        if text.trim().is_empty() {
            return Err(ClassificationFailure::EmptyText);
        }

        let prompt = build_classification_prompt(text);
        let completion = self
            .model
            .complete(&prompt, &CompletionOptions::classification())
            .await?;

        let label = parse_label(&completion.text)?;
        let logprobs = completion
            .token_logprobs
            .ok_or(ClassificationFailure::MissingLogprobs)?;
        let confidence = confidence_from_logprobs(&logprobs)?;

        Ok(ClassificationResult { label, confidence })
    }

    /// Classify `document` in place. On failure the document is unchanged.
    pub async fn classify(&self, document: &mut Document) -> Result<ClassificationResult, ClassificationFailure> {
        let result = self.classify_text(document.raw_text()).await?;
        result.apply_to(document);

        tracing::debug!(
            document_id = %document.id(),
            label = %result.label,
            confidence = result.confidence,
            "Classified document"
        );
        Ok(result)
    }
}

/// Strip whitespace and JSON quoting from the completion and match it
/// against the label set.
pub fn parse_label(completion: &str) -> Result<Label, ClassificationFailure> {
    let cleaned = completion
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim();

    if cleaned.is_empty() {
        return Err(ClassificationFailure::EmptyCompletion);
    }
    Ok(cleaned.parse::<Label>()?)
}

/// `exp(sum(logprobs))`, rounded to 3 decimals.
///
/// The sum stays in log space and is exponentiated once, so long
/// completions do not underflow through repeated multiplication.
pub fn confidence_from_logprobs(logprobs: &[f64]) -> Result<f64, ClassificationFailure> {
    if logprobs.is_empty() {
        return Err(ClassificationFailure::MissingLogprobs);
    }
    if logprobs.iter().any(|lp| lp.is_nan() || *lp == f64::INFINITY) {
        return Err(ClassificationFailure::InvalidLogprob);
    }

    // Providers occasionally report tiny positive values for certain tokens.
    let joint = logprobs.iter().sum::<f64>().min(0.0);
    Ok(round3(joint.exp()))
}

fn round3(p: f64) -> f64 {
    (p * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Completion, LlmError};
    use crate::mock::MockModel;

    #[test]
    fn test_parse_label_strips_quotes() {
        assert_eq!(parse_label("\"Invoice\"").unwrap(), Label::Invoice);
        assert_eq!(parse_label("  Contract \n").unwrap(), Label::Contract);
        assert_eq!(parse_label("'earnings'").unwrap(), Label::Earnings);
        assert!(matches!(parse_label(" \"\" "), Err(ClassificationFailure::EmptyCompletion)));
        assert!(matches!(parse_label("\"Receipt\""), Err(ClassificationFailure::UnknownLabel(_))));
    }

    #[test]
    fn test_confidence_from_logprobs() {
        assert_eq!(confidence_from_logprobs(&[0.0, 0.0]).unwrap(), 1.0);
        // exp(-0.1 - 0.2) = 0.7408...
        assert_eq!(confidence_from_logprobs(&[-0.1, -0.2]).unwrap(), 0.741);
        assert_eq!(confidence_from_logprobs(&[1e-7]).unwrap(), 1.0);
        assert_eq!(confidence_from_logprobs(&[f64::NEG_INFINITY]).unwrap(), 0.0);
        assert!(confidence_from_logprobs(&[]).is_err());
        assert!(confidence_from_logprobs(&[f64::NAN]).is_err());
    }

    #[test]
    fn test_confidence_does_not_underflow_to_nan() {
        let long = vec![-0.5; 5000];
        let p = confidence_from_logprobs(&long).unwrap();
        assert_eq!(p, 0.0);
        assert!(p.is_finite());
    }

    #[tokio::test]
    async fn test_classify_sets_label_and_confidence() {
        let model = MockModel::new().with_default(Completion::with_logprobs("\"Invoice\"", vec![-0.001, -0.002, 0.0]));
        let classifier = Classifier::new(Arc::new(model.clone()));

        let mut doc = Document::new("invoice_1.txt", "INVOICE #42\nAmount due: $1,000");
        let before = doc.clone();
        let result = classifier.classify(&mut doc).await.unwrap();

        assert_eq!(result.label, Label::Invoice);
        assert_eq!(doc.predicted_label(), Some(Label::Invoice));
        assert_eq!(doc.label_confidence().get(&Label::Invoice), Some(&0.997));
        assert!((0.0..=1.0).contains(&doc.confidence()));
        assert_eq!(doc.id(), before.id());
        assert_eq!(doc.metadata(), before.metadata());

        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].options, CompletionOptions::classification());
    }

    #[tokio::test]
    async fn test_classify_failure_leaves_document_unset() {
        let model = MockModel::new().failing();
        let classifier = Classifier::new(Arc::new(model));

        let mut doc = Document::new("contract.txt", "This agreement is made between...");
        let err = classifier.classify(&mut doc).await.unwrap_err();
        assert!(matches!(err, ClassificationFailure::Model(LlmError::Request(_))));
        assert_eq!(doc.predicted_label(), None);
        assert!(doc.label_confidence().is_empty());
    }

    #[tokio::test]
    async fn test_classify_requires_logprobs() {
        let model = MockModel::new().with_default(Completion::text("Earnings"));
        let classifier = Classifier::new(Arc::new(model));
        let err = classifier.classify_text("Q1 revenue grew 12%").await.unwrap_err();
        assert!(matches!(err, ClassificationFailure::MissingLogprobs));
    }

    #[tokio::test]
    async fn test_classify_empty_text_skips_model() {
        let model = MockModel::new();
        let classifier = Classifier::new(Arc::new(model.clone()));
        let err = classifier.classify_text("   ").await.unwrap_err();
        assert!(matches!(err, ClassificationFailure::EmptyText));
        assert!(model.calls().is_empty());
    }
}
