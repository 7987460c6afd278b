use async_trait::async_trait;
use dashmap::DashMap;
use extract::{Completion, CompletionOptions, LanguageModel, LlmError};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Completions keyed by a hash of prompt and options.
pub struct CompletionCache {
    entries: DashMap<String, Completion>,
    max_entries: usize,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl CompletionCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn get(&self, prompt: &str, options: &CompletionOptions) -> Option<Completion> {
        let hit = self.entries.get(&cache_key(prompt, options)).map(|r| r.value().clone());
        let counter = if hit.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        hit
    }

    pub fn insert(&self, prompt: &str, options: &CompletionOptions, completion: Completion) {
        if self.max_entries == 0 {
            return;
        }
        if self.entries.len() >= self.max_entries {
            // Simple eviction: clear 25% when full
            let to_remove: Vec<_> = self
                .entries
                .iter()
                .take((self.max_entries / 4).max(1))
                .map(|r| r.key().clone())
                .collect();
            for key in to_remove {
                self.entries.remove(&key);
            }
        }
        self.entries.insert(cache_key(prompt, options), completion);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

fn cache_key(prompt: &str, options: &CompletionOptions) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    hasher.update([0u8]);
    hasher.update(format!("{options:?}").as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
}

/// Serves repeated (prompt, options) pairs from a [`CompletionCache`].
pub struct CachedModel {
    inner: Arc<dyn LanguageModel>,
    cache: Arc<CompletionCache>,
}

impl CachedModel {
    pub fn new(inner: Arc<dyn LanguageModel>, cache: Arc<CompletionCache>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl LanguageModel for CachedModel {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<Completion, LlmError> {
        if let Some(completion) = self.cache.get(prompt, options) {
            tracing::debug!("Completion served from cache");
            return Ok(completion);
        }

        let completion = self.inner.complete(prompt, options).await?;
        self.cache.insert(prompt, options, completion.clone());
        Ok(completion)
    }
}
