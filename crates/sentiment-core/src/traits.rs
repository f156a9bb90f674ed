use async_trait::async_trait;
use crate::{NewsArticle, Sentiment, SentimentResult, Symbol};

/// Supplies recent headlines for a symbol, in provider order.
///
/// An empty list is a valid answer, not an error.
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch(&self, symbol: &Symbol) -> SentimentResult<Vec<NewsArticle>>;

    fn name(&self) -> &'static str;
}

/// Labels a single headline.
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, headline: &str) -> SentimentResult<Sentiment>;

    fn name(&self) -> &'static str;
}

/// Policy hook for rejecting symbols that are not tradable instruments.
///
/// Consulted by the boundary layer before resolving, never by the orchestrator.
pub trait SymbolValidator: Send + Sync {
    fn is_recognized(&self, symbol: &Symbol) -> bool;

    /// Close matches to offer when a symbol is rejected.
    fn suggestions(&self, _partial: &str, _limit: usize) -> Vec<String> {
        Vec::new()
    }
}

