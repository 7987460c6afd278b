//! Failure types for the two model-backed pipeline stages.

use ingest::UnknownLabel;
use thiserror::Error;

use crate::llm::LlmError;
use crate::schema::SchemaViolation;

#[derive(Error, Debug)]
pub enum ClassificationFailure {
    #[error("document has no text to classify")]
    EmptyText,

    #[error("language model unavailable: {0}")]
    Model(#[from] LlmError),

    #[error("language model returned an empty label")]
    EmptyCompletion,

    #[error("language model returned a label outside the label set: {0}")]
    UnknownLabel(#[from] UnknownLabel),

    #[error("language model returned no token log-probabilities")]
    MissingLogprobs,

    #[error("language model returned a non-finite log-probability")]
    InvalidLogprob,
}

#[derive(Error, Debug)]
pub enum ExtractionFailure {
    #[error("document must be classified before extraction")]
    Unclassified,

    #[error("language model unavailable: {0}")]
    Model(#[from] LlmError),

    #[error("completion is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error(transparent)]
    Schema(#[from] SchemaViolation),
}
