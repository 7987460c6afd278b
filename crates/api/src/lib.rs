//! Batch processing and the query service for classified documents.

pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod retry;
pub mod routes;

use anyhow::{Context, Result};
use extract::{LanguageModel, OpenAiClient};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::cache::{CachedModel, CompletionCache};
use crate::config::AppConfig;
use crate::retry::{RetryPolicy, RetryingModel};

/// Install the global subscriber. `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// HTTP client wrapped in retries, then in the completion cache when enabled.
pub fn build_model(config: &AppConfig) -> Result<(Arc<dyn LanguageModel>, Option<Arc<CompletionCache>>)> {
    let client = OpenAiClient::new(
        config.llm.base_url.clone(),
        config.llm.model.clone(),
        config.llm.api_key.clone(),
        config.request_timeout(),
    )
    .context("Failed to build language model client")?;
    tracing::info!(model = client.model(), base_url = %config.llm.base_url, "Language model client ready");

    if config.llm.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set, sending unauthenticated requests");
    }

    let model: Arc<dyn LanguageModel> = Arc::new(RetryingModel::new(
        Arc::new(client),
        RetryPolicy::from_config(&config.retry),
    ));

    if !config.cache.enabled {
        return Ok((model, None));
    }

    let cache = Arc::new(CompletionCache::new(config.cache.max_entries));
    let model: Arc<dyn LanguageModel> = Arc::new(CachedModel::new(model, cache.clone()));
    Ok((model, Some(cache)))
}
