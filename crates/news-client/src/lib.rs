use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use sentiment_core::{NewsArticle, NewsSource, SentimentResult, Symbol};
use serde_json::Value;
use std::time::Duration;

pub mod demo;
pub mod error;
mod rate_limit;

pub use demo::DemoNewsSource;
pub use error::NewsClientError;
use rate_limit::RateLimiter;

pub const DEFAULT_RAPIDAPI_HOST: &str = "google-news13.p.rapidapi.com";

/// Words that mark a headline as market news even without the ticker in it.
const STOCK_KEYWORDS: &[&str] = &[
    "stock", "share", "equity", "nse", "bse", "market", "trading", "investor",
    "price", "earnings", "profit", "revenue", "quarterly", "financial", "dividend",
];

#[derive(Debug, Clone)]
pub struct NewsClientConfig {
    pub api_key: String,
    pub host: String,
    /// Upper bound on headlines returned per symbol
    pub max_articles: usize,
    /// Requests per minute allowed against the provider
    pub rate_limit: usize,
    pub timeout: Duration,
}

impl NewsClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            host: DEFAULT_RAPIDAPI_HOST.to_string(),
            max_articles: 3,
            rate_limit: 60,
            timeout: Duration::from_secs(15),
        }
    }
}

/// Google News search via RapidAPI
#[derive(Clone)]
pub struct GoogleNewsClient {
    config: NewsClientConfig,
    base_url: String,
    client: Client,
    rate_limiter: RateLimiter,
}

impl GoogleNewsClient {
    pub fn new(config: NewsClientConfig) -> Result<Self, NewsClientError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        let base_url = format!("https://{}", config.host);
        let rate_limiter = RateLimiter::new(config.rate_limit, Duration::from_secs(60));

        Ok(Self {
            config,
            base_url,
            client,
            rate_limiter,
        })
    }

    pub fn search_keyword(symbol: &Symbol) -> String {
        format!("{} stock India NSE BSE share price", symbol)
    }

    /// Send a rate-limited request and map provider status codes.
    async fn send_request(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, NewsClientError> {
        self.rate_limiter.acquire().await;
        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::TOO_MANY_REQUESTS => Err(NewsClientError::RateLimited(
                "RapidAPI rate limit exceeded".to_string(),
            )),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(NewsClientError::Unauthorized(
                format!("HTTP {}: check RapidAPI key and subscription", status.as_u16()),
            )),
            _ => Err(NewsClientError::Status {
                status: status.as_u16(),
                body,
            }),
        }
    }

    /// Search headlines for a symbol, newest provider order preserved.
    pub async fn fetch_news(&self, symbol: &Symbol) -> Result<Vec<NewsArticle>, NewsClientError> {
        let keyword = Self::search_keyword(symbol);
        tracing::info!("Searching Google News for {} (keyword: {})", symbol, keyword);

        let url = format!("{}/search", self.base_url);
        let response = self
            .send_request(
                self.client
                    .get(&url)
                    .header("X-RapidAPI-Key", &self.config.api_key)
                    .header("X-RapidAPI-Host", &self.config.host)
                    .query(&[("keyword", keyword.as_str()), ("lr", "en-IN")]),
            )
            .await?;

        let data: Value = response
            .json()
            .await
            .map_err(|e| NewsClientError::InvalidResponse(e.to_string()))?;

        let articles = parse_articles(&data, symbol, self.config.max_articles);
        tracing::info!("Google News returned {} usable headlines for {}", articles.len(), symbol);
        Ok(articles)
    }
}

#[async_trait]
impl NewsSource for GoogleNewsClient {
    async fn fetch(&self, symbol: &Symbol) -> SentimentResult<Vec<NewsArticle>> {
        Ok(self.fetch_news(symbol).await?)
    }

    fn name(&self) -> &'static str {
        "google-news"
    }
}

/// Extract up to `max` articles from a search response.
///
/// Prefers stock-related titles; when none qualify, falls back to the first
/// `max` items that carry any title at all.
pub fn parse_articles(data: &Value, symbol: &Symbol, max: usize) -> Vec<NewsArticle> {
    let items = news_items(data);
    tracing::debug!("Google News response carried {} items", items.len());

    let related: Vec<NewsArticle> = items
        .iter()
        .filter_map(parse_item)
        .filter(|a| is_stock_related(&a.title, symbol))
        .take(max)
        .collect();

    if !related.is_empty() {
        return related;
    }

    if !items.is_empty() {
        tracing::warn!("No stock-related headlines for {}, using first available items", symbol);
    }
    items.iter().take(max).filter_map(parse_item).collect()
}

fn news_items(data: &Value) -> &[Value] {
    if let Some(list) = data.as_array() {
        return list;
    }
    ["items", "articles", "data"]
        .iter()
        .find_map(|key| data.get(*key).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn first_str<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| item.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
}

fn parse_item(item: &Value) -> Option<NewsArticle> {
    let title = first_str(item, &["title", "headline", "name"])?;

    let published = ["published", "publishedAt", "date", "timestamp"]
        .iter()
        .find_map(|key| match item.get(*key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

    let source = ["source", "publisher"].iter().find_map(|key| match item.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(obj) => obj.get("name").and_then(Value::as_str).map(str::to_string),
        _ => None,
    });

    Some(NewsArticle {
        title: title.to_string(),
        url: first_str(item, &["url", "link", "newsUrl"]).map(str::to_string),
        source,
        published,
    })
}

pub fn is_stock_related(title: &str, symbol: &Symbol) -> bool {
    let title_lower = title.to_lowercase();
    let symbol_lower = symbol.as_str().to_lowercase();

    title_lower.contains(&symbol_lower) || STOCK_KEYWORDS.iter().any(|k| title_lower.contains(k))
}
