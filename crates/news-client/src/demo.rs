use async_trait::async_trait;
use sentiment_core::{NewsArticle, NewsSource, SentimentResult, Symbol};

/// Canned headlines for running without a news API key.
#[derive(Debug, Clone)]
pub struct DemoNewsSource {
    max_articles: usize,
}

impl DemoNewsSource {
    pub fn new(max_articles: usize) -> Self {
        Self { max_articles }
    }

    pub fn headlines_for(&self, symbol: &Symbol) -> Vec<NewsArticle> {
        let templates = [
            (
                format!("{} reports strong quarterly growth in latest earnings", symbol),
                "Demo Financial Times",
                "2025-07-31T10:00:00Z",
            ),
            (
                format!("Market analysts upgrade {} stock rating to buy", symbol),
                "Demo Business Today",
                "2025-07-31T08:30:00Z",
            ),
            (
                format!("Tech sector volatility affects {} trading volumes", symbol),
                "Demo Economic Times",
                "2025-07-31T07:15:00Z",
            ),
        ];

        templates
            .into_iter()
            .take(self.max_articles)
            .map(|(title, source, published)| NewsArticle {
                title,
                url: None,
                source: Some(source.to_string()),
                published: Some(published.to_string()),
            })
            .collect()
    }
}

impl Default for DemoNewsSource {
    fn default() -> Self {
        Self::new(3)
    }
}

#[async_trait]
impl NewsSource for DemoNewsSource {
    async fn fetch(&self, symbol: &Symbol) -> SentimentResult<Vec<NewsArticle>> {
        tracing::debug!("Serving demo headlines for {}", symbol);
        Ok(self.headlines_for(symbol))
    }

    fn name(&self) -> &'static str {
        "demo"
    }
}
