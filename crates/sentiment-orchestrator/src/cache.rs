use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use sentiment_analysis::aggregate;
use sentiment_core::{CacheEntry, Sentiment, SentimentError, SentimentResult, Symbol};
use std::sync::Arc;

/// Latest completed result per symbol.
///
/// Entries are published whole behind an `Arc`, so a reader sees either the
/// previous entry or the new one. Freshness is not stored: callers pass the
/// TTL and the current time on every read.
pub struct CacheStore {
    entries: DashMap<Symbol, Arc<CacheEntry>>,
    max_entries: Option<usize>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: None,
        }
    }

    /// Bound the number of symbols held; the oldest entry by creation time is
    /// evicted when a new symbol would exceed the bound.
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: Some(max_entries.max(1)),
        }
    }

    /// Entry for `symbol` regardless of age
    pub fn get(&self, symbol: &Symbol) -> Option<Arc<CacheEntry>> {
        self.entries.get(symbol).map(|entry| entry.value().clone())
    }

    /// Entry for `symbol` if it passes its structural check and is younger than `ttl`.
    pub fn get_fresh(&self, symbol: &Symbol, ttl: Duration, now: DateTime<Utc>) -> Option<Arc<CacheEntry>> {
        let entry = self.get(symbol)?;

        if let Err(e) = Self::validate(symbol, &entry) {
            tracing::warn!("Ignoring cached entry for {}: {}", symbol, e);
            return None;
        }

        entry.is_fresh(ttl, now).then_some(entry)
    }

    /// Replace whatever is stored for `symbol`. Last write wins.
    pub fn put(&self, symbol: Symbol, entry: Arc<CacheEntry>) {
        let is_new = self.entries.insert(symbol.clone(), entry).is_none();
        if is_new {
            self.evict_if_over_capacity(&symbol);
        }
    }

    /// Structural invariant of a stored entry: keyed under its own symbol and
    /// carrying the overall sentiment its headlines aggregate to.
    pub fn validate(key: &Symbol, entry: &CacheEntry) -> SentimentResult<()> {
        if &entry.symbol != key {
            return Err(SentimentError::CacheCorruption(format!(
                "entry for {} stored under {}",
                entry.symbol, key
            )));
        }

        let sentiments: Vec<Sentiment> = entry.sentiments().collect();
        let expected = aggregate(&sentiments);
        if expected != entry.overall_sentiment {
            return Err(SentimentError::CacheCorruption(format!(
                "overall sentiment {} does not match headlines ({})",
                entry.overall_sentiment, expected
            )));
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn symbols(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self.entries.iter().map(|e| e.key().clone()).collect();
        symbols.sort();
        symbols
    }

    fn evict_if_over_capacity(&self, keep: &Symbol) {
        let Some(max) = self.max_entries else {
            return;
        };

        while self.entries.len() > max {
            let oldest = self
                .entries
                .iter()
                .filter(|e| e.key() != keep)
                .min_by_key(|e| e.value().created_at)
                .map(|e| e.key().clone());

            match oldest {
                Some(symbol) => {
                    tracing::debug!("Evicting cached entry for {} (capacity {})", symbol, max);
                    self.entries.remove(&symbol);
                }
                None => break,
            }
        }
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}
