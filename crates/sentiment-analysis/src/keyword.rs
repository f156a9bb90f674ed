//! Word-list headline classifier.
//!
//! Used in place of the LLM classifier when no API key is configured. Scores a
//! headline by counting finance-flavoured positive and negative words, flipping
//! any word preceded by a negation within a short window.

use async_trait::async_trait;
use sentiment_core::{Sentiment, SentimentClassifier, SentimentResult};
use std::collections::HashSet;

const NEGATION_WORDS: &[&str] = &[
    "not", "no", "never", "don't", "doesn't", "didn't", "isn't", "aren't",
    "wasn't", "weren't", "won't", "wouldn't", "couldn't", "shouldn't", "hardly",
    "barely", "neither", "nor", "without",
];

const NEGATION_WINDOW: usize = 3;

const POSITIVE_WORDS: &[&str] = &[
    "bullish", "rally", "rallies", "surge", "surges", "gain", "gains", "profit",
    "profits", "growth", "beat", "beats", "upgrade", "upgraded", "outperform",
    "strong", "robust", "positive", "rise", "rises", "increase", "up",
    "expansion", "deal", "acquisition", "buy", "record", "optimistic", "boost",
    "jump", "jumps", "soar", "soars", "dividend", "buyback", "recovery",
    "rebound", "upside", "tailwind", "exceeds", "raised",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bearish", "decline", "declines", "loss", "losses", "fall", "falls", "drop",
    "drops", "down", "crash", "plunge", "plunges", "slump", "weak", "poor",
    "negative", "downgrade", "downgraded", "sell", "layoff", "layoffs",
    "lawsuit", "scandal", "miss", "misses", "underperform", "recession",
    "crisis", "fraud", "probe", "investigation", "default", "bankruptcy",
    "warning", "headwind", "lowered", "concern",
];

pub struct KeywordClassifier {
    positive: HashSet<&'static str>,
    negative: HashSet<&'static str>,
    negation: HashSet<&'static str>,
}

impl KeywordClassifier {
    pub fn new() -> Self {
        Self {
            positive: POSITIVE_WORDS.iter().copied().collect(),
            negative: NEGATIVE_WORDS.iter().copied().collect(),
            negation: NEGATION_WORDS.iter().copied().collect(),
        }
    }

    /// Net score: +1 per positive word, -1 per negative word, sign flipped
    /// when a negation sits within `NEGATION_WINDOW` words before it.
    pub fn score(&self, text: &str) -> i32 {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '.' | '!' | '?' | ':' | '"' | '(' | ')'))
            .filter(|w| !w.is_empty())
            .collect();

        let negation_positions: Vec<usize> = words
            .iter()
            .enumerate()
            .filter(|(_, w)| self.negation.contains(*w))
            .map(|(i, _)| i)
            .collect();

        let mut score = 0;
        for (i, word) in words.iter().enumerate() {
            let polarity = if self.positive.contains(*word) {
                1
            } else if self.negative.contains(*word) {
                -1
            } else {
                continue;
            };

            let negated = negation_positions
                .iter()
                .any(|&neg| neg < i && i - neg <= NEGATION_WINDOW);

            score += if negated { -polarity } else { polarity };
        }

        score
    }

    pub fn label(&self, text: &str) -> Sentiment {
        match self.score(text) {
            s if s > 0 => Sentiment::Positive,
            s if s < 0 => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SentimentClassifier for KeywordClassifier {
    async fn classify(&self, headline: &str) -> SentimentResult<Sentiment> {
        Ok(self.label(headline))
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}
