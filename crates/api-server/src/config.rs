use anyhow::{bail, Context, Result};
use sentiment_orchestrator::OrchestratorConfig;
use serde::Serialize;
use std::path::PathBuf;
use std::str::FromStr;

/// Server settings, read from the environment (after `.env` is loaded).
#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    // Upstreams; a missing key switches to the offline fallback
    #[serde(skip_serializing)]
    pub rapidapi_key: Option<String>,
    pub rapidapi_host: String,
    #[serde(skip_serializing)]
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub openai_base_url: Option<String>,

    // Cache and cycle behaviour
    pub cache_ttl_minutes: i64,
    pub cached_lookback_minutes: i64,
    pub max_news_articles: usize,
    pub cycle_timeout_secs: u64,
    pub retry_backoff_ms: u64,
    pub cache_max_entries: Option<usize>,
    pub news_rate_limit: usize,

    pub symbols_file: PathBuf,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let config = Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&get, "PORT", 8000)?,

            rapidapi_key: get("RAPIDAPI_KEY"),
            rapidapi_host: get("RAPIDAPI_HOST").unwrap_or_else(|| news_client::DEFAULT_RAPIDAPI_HOST.to_string()),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_model: get("OPENAI_MODEL"),
            openai_base_url: get("OPENAI_BASE_URL"),

            cache_ttl_minutes: parse_or(&get, "CACHE_TTL_MINUTES", 10)?,
            cached_lookback_minutes: parse_or(&get, "CACHED_LOOKBACK_MINUTES", 60)?,
            max_news_articles: parse_or(&get, "MAX_NEWS_ARTICLES", 3)?,
            cycle_timeout_secs: parse_or(&get, "CYCLE_TIMEOUT_SECS", 30)?,
            retry_backoff_ms: parse_or(&get, "RETRY_BACKOFF_MS", 500)?,
            cache_max_entries: get("CACHE_MAX_ENTRIES")
                .map(|v| v.parse::<usize>().context("CACHE_MAX_ENTRIES must be a positive integer"))
                .transpose()?,
            news_rate_limit: parse_or(&get, "NEWS_RATE_LIMIT", 60)?,

            symbols_file: get("SYMBOLS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/stock_symbols.json")),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        check_minutes("CACHE_TTL_MINUTES", self.cache_ttl_minutes)?;
        check_minutes("CACHED_LOOKBACK_MINUTES", self.cached_lookback_minutes)?;
        if self.max_news_articles == 0 {
            bail!("MAX_NEWS_ARTICLES must be greater than zero");
        }
        if self.cycle_timeout_secs == 0 {
            bail!("CYCLE_TIMEOUT_SECS must be greater than zero");
        }
        if self.news_rate_limit == 0 {
            bail!("NEWS_RATE_LIMIT must be greater than zero");
        }
        if self.cache_max_entries == Some(0) {
            bail!("CACHE_MAX_ENTRIES must be greater than zero when set");
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            ttl: chrono::Duration::minutes(self.cache_ttl_minutes),
            cycle_timeout: std::time::Duration::from_secs(self.cycle_timeout_secs),
            retry_backoff: std::time::Duration::from_millis(self.retry_backoff_ms),
            max_entries: self.cache_max_entries,
        }
    }
}

/// Positive and small enough to become a `chrono::Duration`.
fn check_minutes(key: &str, minutes: i64) -> Result<()> {
    if minutes <= 0 {
        bail!("{key} must be greater than zero");
    }
    if chrono::Duration::try_minutes(minutes).is_none() {
        bail!("{key} is out of range ({minutes})");
    }
    Ok(())
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.parse().with_context(|| format!("{key} has invalid value {raw:?}")),
        None => Ok(default),
    }
}
