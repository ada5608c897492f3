use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

pub const API_KEY_ENV: &str = "NEOAPI_API_KEY";
pub const API_URL_ENV: &str = "NEOAPI_API_URL";
pub const DEFAULT_API_URL: &str = "https://api.neoapi.ai";

/// Exponential backoff envelope: `min(base * 2^attempt, cap)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_retry_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: default_retry_base_delay_ms(),
            max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u64.saturating_pow(attempt.min(32));
        let delay_ms = self.base_delay_ms.saturating_mul(factor);
        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    #[serde(default = "default_min_batch_size")]
    pub min_batch_size: usize,
    #[serde(default = "default_max_flush_interval_ms")]
    pub max_flush_interval_ms: u64,
    #[serde(default = "default_min_flush_interval_ms")]
    pub min_flush_interval_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Only every Nth position of a batch is delivered.
    #[serde(default = "default_check_frequency")]
    pub check_frequency: usize,
    #[serde(default = "default_adjustment_interval_ms")]
    pub adjustment_interval_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            batch_size: default_batch_size(),
            flush_interval_ms: default_flush_interval_ms(),
            max_batch_size: default_max_batch_size(),
            min_batch_size: default_min_batch_size(),
            max_flush_interval_ms: default_max_flush_interval_ms(),
            min_flush_interval_ms: default_min_flush_interval_ms(),
            max_retries: default_max_retries(),
            check_frequency: default_check_frequency(),
            adjustment_interval_ms: default_adjustment_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Defaults plus `NEOAPI_API_KEY` / `NEOAPI_API_URL`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Explicit values win; the environment only fills a missing key or a
    /// URL left at its default.
    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.as_deref().unwrap_or("").trim().is_empty() {
            if let Some(value) = lookup(API_KEY_ENV) {
                if !value.trim().is_empty() {
                    self.api_key = Some(value.trim().to_string());
                }
            }
        }

        if self.api_url == DEFAULT_API_URL {
            if let Some(value) = lookup(API_URL_ENV) {
                if !value.trim().is_empty() {
                    self.api_url = value.trim().to_string();
                }
            }
        }
    }

    pub fn effective_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn adjustment_interval(&self) -> Duration {
        Duration::from_millis(self.adjustment_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.effective_api_key().is_none() {
            return Err(ClientError::Config(format!(
                "API key must be provided either directly or through the {API_KEY_ENV} environment variable"
            )));
        }
        reqwest::Url::parse(self.api_url.trim()).map_err(|error| {
            ClientError::Config(format!("invalid apiUrl '{}': {error}", self.api_url))
        })?;

        if self.min_batch_size == 0 {
            return Err(ClientError::Config(
                "min batch size must be greater than 0".to_string(),
            ));
        }
        if self.min_batch_size > self.max_batch_size {
            return Err(ClientError::Config(format!(
                "min batch size {} exceeds max batch size {}",
                self.min_batch_size, self.max_batch_size
            )));
        }
        if !(self.min_batch_size..=self.max_batch_size).contains(&self.batch_size) {
            return Err(ClientError::Config(format!(
                "batch size {} outside [{}, {}]",
                self.batch_size, self.min_batch_size, self.max_batch_size
            )));
        }

        if self.min_flush_interval_ms == 0 {
            return Err(ClientError::Config(
                "min flush interval must be greater than 0".to_string(),
            ));
        }
        if self.min_flush_interval_ms > self.max_flush_interval_ms {
            return Err(ClientError::Config(format!(
                "min flush interval {}ms exceeds max flush interval {}ms",
                self.min_flush_interval_ms, self.max_flush_interval_ms
            )));
        }
        if !(self.min_flush_interval_ms..=self.max_flush_interval_ms)
            .contains(&self.flush_interval_ms)
        {
            return Err(ClientError::Config(format!(
                "flush interval {}ms outside [{}ms, {}ms]",
                self.flush_interval_ms, self.min_flush_interval_ms, self.max_flush_interval_ms
            )));
        }

        if self.max_retries == 0 {
            return Err(ClientError::Config(
                "max retries must be at least 1".to_string(),
            ));
        }
        if self.check_frequency == 0 {
            return Err(ClientError::Config(
                "check frequency must be at least 1".to_string(),
            ));
        }
        if self.adjustment_interval_ms == 0 {
            return Err(ClientError::Config(
                "adjustment interval must be greater than 0".to_string(),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(ClientError::Config(
                "request timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_batch_size() -> usize {
    10
}

fn default_flush_interval_ms() -> u64 {
    5_000
}

fn default_max_batch_size() -> usize {
    100
}

fn default_min_batch_size() -> usize {
    5
}

fn default_max_flush_interval_ms() -> u64 {
    10_000
}

fn default_min_flush_interval_ms() -> u64 {
    1_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_check_frequency() -> usize {
    1
}

fn default_adjustment_interval_ms() -> u64 {
    2_000
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_retry_base_delay_ms() -> u64 {
    1_000
}

fn default_retry_max_delay_ms() -> u64 {
    30_000
}
