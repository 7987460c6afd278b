//! Scripted language model for deterministic tests.
//!
//! ```rust,ignore
//! let model = MockModel::new()
//!     .with_response("Classify it strictly", Completion::with_logprobs("\"Invoice\"", vec![-0.01]))
//!     .with_response("Extract the following fields", Completion::text(r#"{"vendor": "Acme"}"#));
//! ```

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::llm::{Completion, CompletionOptions, LanguageModel, LlmError};

#[derive(Debug, Clone)]
pub struct MockCall {
    pub prompt: String,
    pub options: CompletionOptions,
}

#[derive(Clone)]
pub struct MockModel {
    /// (prompt substring, response), first match wins.
    responses: Arc<Vec<(String, Completion)>>,
    default_response: Completion,
    fail: bool,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new()
    }
}

impl MockModel {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Vec::new()),
            default_response: Completion::text(""),
            fail: false,
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Respond with `completion` to any prompt containing `needle`.
    pub fn with_response(mut self, needle: impl Into<String>, completion: Completion) -> Self {
        Arc::make_mut(&mut self.responses).push((needle.into(), completion));
        self
    }

    pub fn with_default(mut self, completion: Completion) -> Self {
        self.default_response = completion;
        self
    }

    /// Every call fails as if the model were unreachable.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<Completion, LlmError> {
        self.call_log.lock().unwrap_or_else(|e| e.into_inner()).push(MockCall {
            prompt: prompt.to_string(),
            options: options.clone(),
        });

        if self.fail {
            return Err(LlmError::Request("mock model unavailable".to_string()));
        }

        let completion = self
            .responses
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, completion)| completion.clone())
            .unwrap_or_else(|| self.default_response.clone());
        Ok(completion)
    }
}
