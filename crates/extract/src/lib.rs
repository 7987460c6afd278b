pub mod classifier;
pub mod error;
pub mod extractor;
pub mod llm;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod prompt;
pub mod schema;

pub use classifier::{ClassificationResult, Classifier};
pub use error::{ClassificationFailure, ExtractionFailure};
pub use extractor::MetadataExtractor;
pub use llm::{Completion, CompletionOptions, LanguageModel, LlmError, OpenAiClient};
pub use schema::{ExtractedMetadata, schema_fields};
