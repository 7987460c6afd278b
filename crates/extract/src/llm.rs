use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tokens requested for a classification answer: enough for one quoted label.
pub const CLASSIFICATION_MAX_TOKENS: u32 = 3;

/// Alternatives requested per token when log-probabilities are on.
pub const TOP_LOGPROBS: u8 = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub want_logprobs: bool,
    pub json_mode: bool,
}

impl CompletionOptions {
    /// Short, deterministic completion with per-token log-probabilities.
    pub fn classification() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: Some(CLASSIFICATION_MAX_TOKENS),
            want_logprobs: true,
            json_mode: false,
        }
    }

    /// Deterministic completion constrained to a single JSON object.
    pub fn extraction() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: None,
            want_logprobs: false,
            json_mode: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    /// Log-probability of each emitted token, when requested and supported.
    pub token_logprobs: Option<Vec<f64>>,
}

impl Completion {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            token_logprobs: None,
        }
    }

    pub fn with_logprobs(text: impl Into<String>, logprobs: Vec<f64>) -> Self {
        Self {
            text: text.into(),
            token_logprobs: Some(logprobs),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("failed to reach language model: {0}")]
    Request(String),

    #[error("language model request timed out")]
    Timeout,

    #[error("language model returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode language model response: {0}")]
    Decode(String),

    #[error("language model returned no choices")]
    NoChoices,
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else if e.is_decode() {
            LlmError::Decode(e.to_string())
        } else {
            LlmError::Request(e.to_string())
        }
    }
}

/// The text-completion capability the classifier and extractor depend on.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<Completion, LlmError>;
}

/// Client for OpenAI-compatible `/chat/completions` endpoints
/// (OpenAI itself, Ollama's `/v1`, vLLM, ...).
#[derive(Clone)]
pub struct OpenAiClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    logprobs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_logprobs: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
    #[serde(default)]
    logprobs: Option<ChoiceLogprobs>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceLogprobs {
    #[serde(default)]
    content: Option<Vec<TokenLogprob>>,
}

#[derive(Deserialize)]
struct TokenLogprob {
    logprob: f64,
}

impl OpenAiClient {
    pub fn new(base_url: String, model: String, api_key: Option<String>, timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Request(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request<'a>(&'a self, prompt: &'a str, options: &CompletionOptions) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            logprobs: options.want_logprobs.then_some(true),
            top_logprobs: options.want_logprobs.then_some(TOP_LOGPROBS),
            response_format: options.json_mode.then_some(ResponseFormat { kind: "json_object" }),
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<Completion, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = self.build_request(prompt, options);

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let chat: ChatResponse = response.json().await?;
        let choice = chat.choices.into_iter().next().ok_or(LlmError::NoChoices)?;

        let token_logprobs = choice
            .logprobs
            .and_then(|lp| lp.content)
            .map(|tokens| tokens.into_iter().map(|t| t.logprob).collect());

        tracing::debug!(model = %self.model, json_mode = options.json_mode, "Completion received");

        Ok(Completion {
            text: choice.message.content.unwrap_or_default(),
            token_logprobs,
        })
    }
}
