use thiserror::Error;

/// Errors surfaced by a sentiment resolution.
///
/// `Clone` because a single cycle outcome is handed to the leader and every
/// coalesced follower.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SentimentError {
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Classification error: {0}")]
    Classification(String),

    #[error("Cache corruption: {0}")]
    CacheCorruption(String),

    #[error("Cycle cancelled before completion")]
    Cancelled,
}

impl SentimentError {
    /// Transient failures the leader may retry once.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SentimentError::UpstreamUnavailable(_))
    }
}

pub type SentimentResult<T> = Result<T, SentimentError>;
