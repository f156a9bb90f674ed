use sentiment_core::Sentiment;
use serde::{Deserialize, Serialize};

pub mod keyword;
pub use keyword::KeywordClassifier;

/// Per-label counts over a set of headline sentiments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SentimentTally {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl SentimentTally {
    pub fn from_sentiments<I>(sentiments: I) -> Self
    where
        I: IntoIterator<Item = Sentiment>,
    {
        let mut tally = Self::default();
        for sentiment in sentiments {
            tally.record(sentiment);
        }
        tally
    }

    pub fn record(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Negative => self.negative += 1,
            Sentiment::Neutral => self.neutral += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.negative + self.neutral
    }

    /// Majority vote with neutral bias.
    ///
    /// Positive or negative wins only by beating the other polar label outright
    /// while at least matching the neutral count. Every tie, a neutral lead and
    /// an empty tally resolve to neutral.
    pub fn verdict(&self) -> Sentiment {
        if self.positive > self.negative && self.positive >= self.neutral {
            Sentiment::Positive
        } else if self.negative > self.positive && self.negative >= self.neutral {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }
}

/// Collapse per-headline sentiments into one overall sentiment.
///
/// Depends only on the multiset of inputs, never on their order.
pub fn aggregate(sentiments: &[Sentiment]) -> Sentiment {
    SentimentTally::from_sentiments(sentiments.iter().copied()).verdict()
}
