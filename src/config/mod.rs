//! Configuration management for jobpulse
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::models::JobSource;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Crawler configuration
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Per-source endpoints and pacing
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Orchestration and fetch settings shared by every source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of sources crawled at the same time
    pub max_concurrent_sources: usize,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Overall deadline for one source's multi-page crawl, in seconds
    pub source_timeout_secs: u64,

    /// Postings requested per page
    pub limit_per_page: u32,

    /// Backoff unit after HTTP 429, multiplied by the attempt number (ms)
    pub rate_limited_backoff_ms: u64,

    /// Backoff unit after HTTP 5xx or transport errors (ms)
    pub server_error_backoff_ms: u64,
}

/// Settings for one listing source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Site root used to build listing and detail URLs
    pub base_url: String,

    /// Minimum spacing between two requests, in milliseconds
    pub min_interval_ms: u64,

    /// Maximum attempts per request
    pub max_attempts: u32,
}

/// Per-source configuration for the four built-in adapters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub wanted: SourceConfig,
    pub jobkorea: SourceConfig,
    pub jobplanet: SourceConfig,
    pub linkedin: SourceConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl SourceConfig {
    fn new(base_url: &str, min_interval_ms: u64, max_attempts: u32) -> Self {
        Self {
            base_url: base_url.to_string(),
            min_interval_ms,
            max_attempts,
        }
    }

    /// Minimum spacing between requests as Duration
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

impl SourcesConfig {
    /// Settings for one source
    pub fn get(&self, source: JobSource) -> &SourceConfig {
        match source {
            JobSource::Wanted => &self.wanted,
            JobSource::JobKorea => &self.jobkorea,
            JobSource::JobPlanet => &self.jobplanet,
            JobSource::LinkedIn => &self.linkedin,
        }
    }

    /// Mutable settings for one source
    pub fn get_mut(&mut self, source: JobSource) -> &mut SourceConfig {
        match source {
            JobSource::Wanted => &mut self.wanted,
            JobSource::JobKorea => &mut self.jobkorea,
            JobSource::JobPlanet => &mut self.jobplanet,
            JobSource::LinkedIn => &mut self.linkedin,
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            wanted: SourceConfig::new("https://www.wanted.co.kr", 1500, 3),
            jobkorea: SourceConfig::new("https://www.jobkorea.co.kr", 2000, 3),
            jobplanet: SourceConfig::new("https://www.jobplanet.co.kr", 2500, 3),
            linkedin: SourceConfig::new("https://www.linkedin.com", 3000, 2),
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_sources: 5,
            request_timeout_secs: 30,
            source_timeout_secs: 120,
            limit_per_page: 20,
            rate_limited_backoff_ms: 10_000,
            server_error_backoff_ms: 2_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable variables fall back to the defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = CrawlerConfig::default();

        let crawler = CrawlerConfig {
            max_concurrent_sources: env_parse("JOBPULSE_MAX_CONCURRENT_SOURCES")
                .unwrap_or(defaults.max_concurrent_sources),
            request_timeout_secs: env_parse("JOBPULSE_REQUEST_TIMEOUT")
                .unwrap_or(defaults.request_timeout_secs),
            source_timeout_secs: env_parse("JOBPULSE_SOURCE_TIMEOUT")
                .unwrap_or(defaults.source_timeout_secs),
            limit_per_page: env_parse("JOBPULSE_LIMIT_PER_PAGE")
                .unwrap_or(defaults.limit_per_page),
            rate_limited_backoff_ms: env_parse("JOBPULSE_RATE_LIMITED_BACKOFF_MS")
                .unwrap_or(defaults.rate_limited_backoff_ms),
            server_error_backoff_ms: env_parse("JOBPULSE_SERVER_ERROR_BACKOFF_MS")
                .unwrap_or(defaults.server_error_backoff_ms),
        };

        let mut sources = SourcesConfig::default();
        for source in JobSource::all() {
            let prefix = format!("JOBPULSE_{}", source.as_str().to_uppercase());
            let entry = sources.get_mut(source);
            if let Ok(base_url) = std::env::var(format!("{prefix}_BASE_URL")) {
                entry.base_url = base_url;
            }
            if let Some(ms) = env_parse(&format!("{prefix}_MIN_INTERVAL_MS")) {
                entry.min_interval_ms = ms;
            }
            if let Some(attempts) = env_parse(&format!("{prefix}_MAX_ATTEMPTS")) {
                entry.max_attempts = attempts;
            }
        }

        let logging = LoggingConfig {
            level: std::env::var("JOBPULSE_LOG_LEVEL").unwrap_or_else(|_| String::from("info")),
            format: std::env::var("JOBPULSE_LOG_FORMAT").unwrap_or_else(|_| String::from("text")),
        };

        let config = Self {
            crawler,
            sources,
            logging,
        };
        config.validate().context("Invalid configuration from environment")?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.crawler.max_concurrent_sources == 0 {
            anyhow::bail!("max_concurrent_sources must be greater than 0");
        }

        if self.crawler.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        if self.crawler.source_timeout_secs == 0 {
            anyhow::bail!("source_timeout_secs must be greater than 0");
        }

        if self.crawler.limit_per_page == 0 {
            anyhow::bail!("limit_per_page must be greater than 0");
        }

        for source in JobSource::all() {
            let entry = self.sources.get(source);
            if entry.max_attempts == 0 {
                anyhow::bail!("{source}: max_attempts must be greater than 0");
            }
            if entry.min_interval_ms == 0 {
                anyhow::bail!("{source}: min_interval_ms must be greater than 0");
            }
            url::Url::parse(&entry.base_url)
                .with_context(|| format!("{source}: invalid base_url {}", entry.base_url))?;
        }

        Ok(())
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.crawler.request_timeout_secs)
    }

    /// Get per-source crawl deadline as Duration
    #[must_use]
    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.crawler.source_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            sources: SourcesConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_concurrent_sources() {
        let mut config = Config::default();
        config.crawler.max_concurrent_sources = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_base_url() {
        let mut config = Config::default();
        config.sources.jobplanet.base_url = "not a url".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("jobplanet"));
    }

    #[test]
    fn test_default_source_pacing() {
        let sources = SourcesConfig::default();
        assert_eq!(sources.wanted.min_interval(), Duration::from_millis(1500));
        assert_eq!(sources.linkedin.min_interval(), Duration::from_secs(3));
        assert_eq!(sources.linkedin.max_attempts, 2);
        assert_eq!(sources.get(JobSource::JobKorea).max_attempts, 3);
    }

    #[test]
    fn test_timeout_conversion() {
        let config = Config::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.source_timeout(), Duration::from_secs(120));
    }
}
