use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::SentimentError;

/// Longest ticker accepted by the symbol grammar.
pub const MAX_SYMBOL_LEN: usize = 20;

/// Normalized ticker: trimmed, uppercase ASCII alphanumeric.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema), schema(value_type = String, example = "TCS"))]
pub struct Symbol(String);

impl Symbol {
    /// Normalize and validate a raw symbol.
    pub fn parse(raw: &str) -> Result<Self, SentimentError> {
        let normalized = raw.trim().to_ascii_uppercase();

        if normalized.is_empty() {
            return Err(SentimentError::InvalidSymbol("symbol cannot be empty".to_string()));
        }
        if normalized.len() > MAX_SYMBOL_LEN {
            return Err(SentimentError::InvalidSymbol(format!(
                "symbol '{}' exceeds {} characters",
                normalized, MAX_SYMBOL_LEN
            )));
        }
        if !normalized.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SentimentError::InvalidSymbol(format!(
                "symbol '{}' must be alphanumeric",
                normalized
            )));
        }

        Ok(Symbol(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Symbol {
    type Err = SentimentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Symbol::parse(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = SentimentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Symbol::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

/// Headline sentiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = SentimentError;

    /// Strict parse: anything outside the three labels is a classification error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            other => Err(SentimentError::Classification(format!(
                "unexpected sentiment label '{}'",
                other
            ))),
        }
    }
}

/// Raw news article as returned by a news source, before classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub published: Option<String>,
}

impl NewsArticle {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: None,
            source: None,
            published: None,
        }
    }
}

/// A headline paired with its classified sentiment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Headline {
    pub title: String,
    pub sentiment: Sentiment,
}

/// Result of one completed fetch-classify-aggregate cycle.
///
/// Immutable once built; a later cycle for the same symbol replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub symbol: Symbol,
    /// Headlines in the order the news source returned them.
    pub headlines: Vec<Headline>,
    pub overall_sentiment: Sentiment,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(
        symbol: Symbol,
        headlines: Vec<Headline>,
        overall_sentiment: Sentiment,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol,
            headlines,
            overall_sentiment,
            created_at,
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.created_at
    }

    /// Fresh while `0 <= now - created_at < ttl`. A creation time ahead of
    /// `now` (clock stepped backwards) counts as stale.
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let age = self.age(now);
        age >= Duration::zero() && age < ttl
    }

    pub fn sentiments(&self) -> impl Iterator<Item = Sentiment> + '_ {
        self.headlines.iter().map(|h| h.sentiment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_normalization() {
        assert_eq!(Symbol::parse("  tcs ").unwrap().as_str(), "TCS");
        assert_eq!(Symbol::parse("HdfcBank").unwrap(), Symbol::parse("HDFCBANK").unwrap());
    }

    #[test]
    fn test_symbol_grammar_rejections() {
        assert!(matches!(Symbol::parse(""), Err(SentimentError::InvalidSymbol(_))));
        assert!(matches!(Symbol::parse("   "), Err(SentimentError::InvalidSymbol(_))));
        assert!(matches!(Symbol::parse("BAJAJ-AUTO"), Err(SentimentError::InvalidSymbol(_))));
        assert!(matches!(Symbol::parse("M&M"), Err(SentimentError::InvalidSymbol(_))));

        let too_long = "A".repeat(MAX_SYMBOL_LEN + 1);
        assert!(matches!(Symbol::parse(&too_long), Err(SentimentError::InvalidSymbol(_))));
        assert!(Symbol::parse(&"A".repeat(MAX_SYMBOL_LEN)).is_ok());
    }

    #[test]
    fn test_symbol_serde_validates() {
        let symbol: Symbol = serde_json::from_str("\"infy\"").unwrap();
        assert_eq!(symbol.as_str(), "INFY");
        assert!(serde_json::from_str::<Symbol>("\"not valid\"").is_err());
    }

    #[test]
    fn test_sentiment_parse_is_strict() {
        assert_eq!("Positive".parse::<Sentiment>().unwrap(), Sentiment::Positive);
        assert_eq!(" neutral ".parse::<Sentiment>().unwrap(), Sentiment::Neutral);
        assert!(matches!(
            "mixed".parse::<Sentiment>(),
            Err(SentimentError::Classification(_))
        ));
        assert_eq!(serde_json::to_string(&Sentiment::Negative).unwrap(), "\"negative\"");
    }

    #[test]
    fn test_entry_freshness_window() {
        let created = Utc::now();
        let entry = CacheEntry::new(Symbol::parse("TCS").unwrap(), vec![], Sentiment::Neutral, created);
        let ttl = Duration::minutes(10);

        assert!(entry.is_fresh(ttl, created));
        assert!(entry.is_fresh(ttl, created + Duration::minutes(10) - Duration::milliseconds(1)));
        assert!(!entry.is_fresh(ttl, created + Duration::minutes(10)));
        assert!(!entry.is_fresh(ttl, created - Duration::seconds(1)));
    }
}
