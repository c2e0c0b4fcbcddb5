// src/config/fetch.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_FETCH_CONFIG_PATH: &str = "FEED_FETCH_CONFIG_PATH";
pub const DEFAULT_FETCH_CONFIG_TOML: &str = "config/fetch.toml";
pub const DEFAULT_FETCH_CONFIG_JSON: &str = "config/fetch.json";

const DEFAULT_MIRRORS: [&str; 2] = ["https://www.reddit.com", "https://old.reddit.com"];
const DEFAULT_BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const DEFAULT_FALLBACK_UA: &str = "Mozilla/5.0 (compatible; RedditFeedFetcher/1.0)";
const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

/// Transport-level retry for transient statuses and dropped connections.
/// Backoff before retry `n` (1-based) is `backoff_factor * 2^(n-1)` seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_statuses: Vec<u16>,
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_statuses: vec![429, 500, 502, 503, 504],
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
        }
    }
}

impl RetryPolicy {
    pub fn retries_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }

    pub fn backoff(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(16) as i32;
        Duration::try_from_secs_f64(self.backoff_factor * 2f64.powi(exp)).unwrap_or_default()
    }
}

/// Everything the fetch pipeline needs to know about mirrors, pacing and headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Mirror base URLs in fallback priority order.
    pub mirrors: Vec<String>,
    /// Host fragment a direct post URL must contain to be accepted.
    pub canonical_domain: String,
    /// Prefix for permalinks; link posts pointing here are crossposts.
    pub permalink_base: String,
    /// `limit` used by the paginated request variants.
    pub page_size: u32,
    pub politeness_delay_ms: u64,
    pub rate_limit_cooldown_ms: u64,
    pub endpoint_cooldown_ms: u64,
    pub request_timeout_secs: u64,
    /// Retry a failed TLS handshake with certificate verification off.
    pub insecure_tls_fallback: bool,
    pub user_agent: String,
    pub fallback_user_agent: String,
    pub retry: RetryPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            mirrors: DEFAULT_MIRRORS.iter().map(|m| m.to_string()).collect(),
            canonical_domain: "reddit.com".to_string(),
            permalink_base: "https://www.reddit.com".to_string(),
            page_size: 25,
            politeness_delay_ms: 1_500,
            rate_limit_cooldown_ms: 5_000,
            endpoint_cooldown_ms: 1_000,
            request_timeout_secs: 45,
            insecure_tls_fallback: true,
            user_agent: DEFAULT_BROWSER_UA.to_string(),
            fallback_user_agent: DEFAULT_FALLBACK_UA.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

impl FetchConfig {
    /// Load from an explicit path. Supports TOML or JSON formats.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading fetch config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        parse_config(&content, ext.as_str())
            .with_context(|| format!("parsing fetch config {}", path.display()))
    }

    /// Load config using env var + fallbacks:
    /// 1) $FEED_FETCH_CONFIG_PATH
    /// 2) config/fetch.toml
    /// 3) config/fetch.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_FETCH_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!(
                "{ENV_FETCH_CONFIG_PATH} points to non-existent path {}",
                pb.display()
            ));
        }
        for candidate in [DEFAULT_FETCH_CONFIG_TOML, DEFAULT_FETCH_CONFIG_JSON] {
            let pb = PathBuf::from(candidate);
            if pb.exists() {
                return Self::load_from(&pb);
            }
        }
        Ok(Self::default())
    }

    /// Same config with every sleep set to zero. Handy for tests and local probes.
    pub fn without_delays(mut self) -> Self {
        self.politeness_delay_ms = 0;
        self.rate_limit_cooldown_ms = 0;
        self.endpoint_cooldown_ms = 0;
        self.retry.backoff_factor = 0.0;
        self
    }

    pub fn with_mirrors<I, S>(mut self, mirrors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mirrors = mirrors.into_iter().map(Into::into).collect();
        self.sanitized()
    }

    /// Repair values that would make the pipeline misbehave.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        self.mirrors = self
            .mirrors
            .into_iter()
            .map(|m| m.trim().trim_end_matches('/').to_string())
            .filter(|m| !m.is_empty())
            .collect();
        if self.mirrors.is_empty() {
            self.mirrors = defaults.mirrors;
        }
        if self.canonical_domain.trim().is_empty() {
            self.canonical_domain = defaults.canonical_domain;
        }
        self.permalink_base = self.permalink_base.trim_end_matches('/').to_string();
        if self.permalink_base.is_empty() {
            self.permalink_base = defaults.permalink_base;
        }
        if self.page_size == 0 {
            self.page_size = defaults.page_size;
        }
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = defaults.request_timeout_secs;
        }
        if self.user_agent.trim().is_empty() {
            self.user_agent = defaults.user_agent;
        }
        if self.fallback_user_agent.trim().is_empty() {
            self.fallback_user_agent = defaults.fallback_user_agent;
        }
        if !self.retry.backoff_factor.is_finite() || self.retry.backoff_factor < 0.0 {
            self.retry.backoff_factor = DEFAULT_BACKOFF_FACTOR;
        }
        self
    }

    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }

    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_millis(self.rate_limit_cooldown_ms)
    }

    pub fn endpoint_cooldown(&self) -> Duration {
        Duration::from_millis(self.endpoint_cooldown_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<FetchConfig> {
    let try_toml_first = hint_ext == "toml";
    if try_toml_first {
        if let Ok(cfg) = toml::from_str::<FetchConfig>(s) {
            return Ok(cfg.sanitized());
        }
    }
    if let Ok(cfg) = serde_json::from_str::<FetchConfig>(s) {
        return Ok(cfg.sanitized());
    }
    if !try_toml_first {
        if let Ok(cfg) = toml::from_str::<FetchConfig>(s) {
            return Ok(cfg.sanitized());
        }
    }
    Err(anyhow!("unsupported fetch config format"))
}
