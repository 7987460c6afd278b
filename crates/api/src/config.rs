use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub mode: OperationMode,
    pub llm: LlmConfig,
    pub concurrency: ConcurrencyConfig,
    pub retry: RetryConfig,
    pub cache: CacheConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OperationMode {
    /// Wide fan-out, short timeouts, aggressive caching.
    Fast,
    #[default]
    Balanced,
    /// Narrow fan-out, patient retries, no cache.
    Accurate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    pub max_concurrent_documents: usize,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub output_dir: PathBuf,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            api_key: None,
        }
    }
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        AppConfig::for_mode(OperationMode::Balanced).concurrency
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        AppConfig::for_mode(OperationMode::Balanced).retry
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        AppConfig::for_mode(OperationMode::Balanced).cache
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("results/output_json"),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::for_mode(OperationMode::Balanced)
    }
}

impl AppConfig {
    /// Preset tuning for `mode`; llm, server and storage sections use defaults.
    pub fn for_mode(mode: OperationMode) -> Self {
        let (concurrency, retry, cache) = match mode {
            OperationMode::Fast => (
                ConcurrencyConfig {
                    max_concurrent_documents: 10,
                    request_timeout_secs: 30,
                },
                RetryConfig {
                    max_retries: 2,
                    initial_backoff_ms: 500,
                    max_backoff_ms: 5000,
                },
                CacheConfig {
                    enabled: true,
                    max_entries: 50000,
                },
            ),
            OperationMode::Balanced => (
                ConcurrencyConfig {
                    max_concurrent_documents: 5,
                    request_timeout_secs: 60,
                },
                RetryConfig {
                    max_retries: 3,
                    initial_backoff_ms: 1000,
                    max_backoff_ms: 10000,
                },
                CacheConfig {
                    enabled: true,
                    max_entries: 10000,
                },
            ),
            OperationMode::Accurate => (
                ConcurrencyConfig {
                    max_concurrent_documents: 2,
                    request_timeout_secs: 120,
                },
                RetryConfig {
                    max_retries: 5,
                    initial_backoff_ms: 2000,
                    max_backoff_ms: 20000,
                },
                CacheConfig {
                    enabled: false,
                    max_entries: 0,
                },
            ),
        };

        Self {
            mode,
            llm: LlmConfig::default(),
            concurrency,
            retry,
            cache,
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
        }
    }

    /// Swap the tuning sections for `mode`'s preset.
    pub fn apply_mode(&mut self, mode: OperationMode) {
        let preset = Self::for_mode(mode);
        self.mode = mode;
        self.concurrency = preset.concurrency;
        self.retry = preset.retry;
        self.cache = preset.cache;
    }

    /// File (if any), then `mode` preset (if any), then environment.
    pub fn load(path: Option<&Path>, mode: Option<OperationMode>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("Invalid config file {}", path.display()))?
            }
            None => Self::default(),
        };

        if let Some(mode) = mode {
            config.apply_mode(mode);
        }
        config.apply_env(|key| std::env::var(key).ok());

        Ok(config)
    }

    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        if let Some(base_url) = get("LLM_BASE_URL") {
            self.llm.base_url = base_url;
        }
        if let Some(model) = get("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(api_key) = get("OPENAI_API_KEY") {
            self.llm.api_key = Some(api_key);
        }
        if let Some(output_dir) = get("DOCFLOW_OUTPUT_DIR") {
            self.storage.output_dir = PathBuf::from(output_dir);
        }
        if let Some(bind) = get("DOCFLOW_BIND") {
            self.server.bind = bind;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.concurrency.request_timeout_secs)
    }
}
