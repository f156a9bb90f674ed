//! Per-symbol sentiment resolution.
//!
//! Serves fresh cached results, coalesces concurrent misses for the same
//! symbol into a single fetch/classify/aggregate cycle, and publishes the
//! cycle's outcome to the cache and to every waiting caller.

use chrono::{DateTime, Duration, Utc};
use futures_util::future::try_join_all;
use sentiment_analysis::aggregate;
use sentiment_core::{
    CacheEntry, Clock, Headline, NewsSource, SentimentClassifier, SentimentError, SentimentResult, Symbol,
    SystemClock,
};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

pub mod cache;
mod inflight;

pub use cache::CacheStore;

use inflight::{follow, InFlight, Outcome, Role};

/// Default freshness window for cached results
pub const DEFAULT_TTL_MINUTES: i64 = 10;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// A cached entry younger than this is served without a new cycle
    pub ttl: Duration,
    /// Upper bound on one fetch/classify/aggregate cycle
    pub cycle_timeout: std::time::Duration,
    /// Pause before the single retry of a transient upstream failure
    pub retry_backoff: std::time::Duration,
    /// Optional bound on cached symbols; oldest entries are evicted first
    pub max_entries: Option<usize>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(DEFAULT_TTL_MINUTES),
            cycle_timeout: std::time::Duration::from_secs(30),
            retry_backoff: std::time::Duration::from_millis(500),
            max_entries: None,
        }
    }
}

/// Result of [`SentimentOrchestrator::resolve`]
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub entry: Arc<CacheEntry>,
    /// True when served from cache without running or joining a cycle
    pub was_cached: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub cached_symbols: usize,
    pub in_flight: usize,
}

pub struct SentimentOrchestrator {
    news: Arc<dyn NewsSource>,
    classifier: Arc<dyn SentimentClassifier>,
    clock: Arc<dyn Clock>,
    cache: CacheStore,
    in_flight: InFlight,
    config: OrchestratorConfig,
}

impl SentimentOrchestrator {
    pub fn new(
        news: Arc<dyn NewsSource>,
        classifier: Arc<dyn SentimentClassifier>,
        config: OrchestratorConfig,
    ) -> Self {
        let cache = match config.max_entries {
            Some(max) => CacheStore::with_max_entries(max),
            None => CacheStore::new(),
        };

        tracing::info!(
            "Sentiment orchestrator ready (news: {}, classifier: {}, ttl: {}m)",
            news.name(),
            classifier.name(),
            config.ttl.num_minutes()
        );

        Self {
            news,
            classifier,
            clock: Arc::new(SystemClock),
            cache,
            in_flight: InFlight::new(),
            config,
        }
    }

    /// Replace the time source (tests drive freshness with a manual clock)
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn news_source_name(&self) -> &'static str {
        self.news.name()
    }

    pub fn classifier_name(&self) -> &'static str {
        self.classifier.name()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            cached_symbols: self.cache.len(),
            in_flight: self.in_flight.len(),
        }
    }

    /// Normalize `raw_symbol` and resolve its sentiment.
    pub async fn resolve(&self, raw_symbol: &str) -> SentimentResult<Resolution> {
        let symbol = Symbol::parse(raw_symbol)?;
        self.resolve_symbol(&symbol).await
    }

    /// Serve a fresh cached entry, or run (or join) the one cycle for `symbol`.
    pub async fn resolve_symbol(&self, symbol: &Symbol) -> SentimentResult<Resolution> {
        loop {
            if let Some(entry) = self.cache.get_fresh(symbol, self.config.ttl, self.clock.now()) {
                tracing::debug!("Cache hit for {}", symbol);
                return Ok(Resolution {
                    entry,
                    was_cached: true,
                });
            }

            match self.in_flight.join(symbol) {
                Role::Leader(guard) => {
                    // A cycle may have finished between the cache check and the join
                    if let Some(entry) = self.cache.get_fresh(symbol, self.config.ttl, self.clock.now()) {
                        guard.complete(Ok(entry.clone()));
                        return Ok(Resolution {
                            entry,
                            was_cached: true,
                        });
                    }

                    let outcome = self.run_cycle(symbol).await;
                    guard.complete(outcome.clone());
                    return outcome.map(|entry| Resolution {
                        entry,
                        was_cached: false,
                    });
                }
                Role::Follower(rx) => {
                    tracing::debug!("Joining in-flight cycle for {}", symbol);
                    match follow(rx).await {
                        Err(SentimentError::Cancelled) => {
                            tracing::info!("Cycle for {} was abandoned, taking over", symbol);
                            continue;
                        }
                        outcome => {
                            return outcome.map(|entry| Resolution {
                                entry,
                                was_cached: false,
                            })
                        }
                    }
                }
            }
        }
    }

    /// Cached entry for `raw_symbol` no older than `max_age`. Never triggers a cycle.
    pub fn peek(&self, raw_symbol: &str, max_age: Duration) -> SentimentResult<Option<Arc<CacheEntry>>> {
        let symbol = Symbol::parse(raw_symbol)?;
        Ok(self.cache.get_fresh(&symbol, max_age, self.clock.now()))
    }

    async fn run_cycle(&self, symbol: &Symbol) -> Outcome {
        let started = Instant::now();
        tracing::info!("Starting sentiment cycle for {}", symbol);

        let outcome = match tokio::time::timeout(self.config.cycle_timeout, self.fetch_and_classify(symbol)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(SentimentError::UpstreamUnavailable(format!(
                "cycle for {} timed out after {:?}",
                symbol, self.config.cycle_timeout
            ))),
        };

        match &outcome {
            Ok(entry) => tracing::info!(
                "Sentiment for {}: {} from {} headlines ({}ms)",
                symbol,
                entry.overall_sentiment,
                entry.headlines.len(),
                started.elapsed().as_millis()
            ),
            Err(e) => tracing::warn!("Sentiment cycle for {} failed: {}", symbol, e),
        }

        outcome
    }

    async fn fetch_and_classify(&self, symbol: &Symbol) -> Outcome {
        let articles = self.with_retry("news fetch", symbol, || self.news.fetch(symbol)).await?;
        tracing::debug!("Fetched {} articles for {}", articles.len(), symbol);

        // Concurrent, but results stay in article order
        let headlines = try_join_all(articles.into_iter().map(|article| async move {
            let sentiment = self
                .with_retry("classification", symbol, || self.classifier.classify(&article.title))
                .await?;
            Ok::<_, SentimentError>(Headline {
                title: article.title,
                sentiment,
            })
        }))
        .await?;

        let sentiments: Vec<_> = headlines.iter().map(|h| h.sentiment).collect();
        let overall = aggregate(&sentiments);
        let entry = Arc::new(CacheEntry::new(symbol.clone(), headlines, overall, self.clock.now()));

        self.cache.put(symbol.clone(), entry.clone());
        Ok(entry)
    }

    /// Run `op`, retrying exactly once after the backoff if it fails with a
    /// retryable error.
    async fn with_retry<T, F, Fut>(&self, what: &str, symbol: &Symbol, mut op: F) -> SentimentResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = SentimentResult<T>>,
    {
        match op().await {
            Err(e) if e.is_retryable() => {
                tracing::warn!("{} for {} failed ({}), retrying once", what, symbol, e);
                tokio::time::sleep(self.config.retry_backoff).await;
                op().await
            }
            other => other,
        }
    }
}
