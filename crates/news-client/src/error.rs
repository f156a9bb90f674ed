use sentiment_core::SentimentError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NewsClientError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Rate limited by news provider: {0}")]
    RateLimited(String),

    #[error("News provider rejected credentials: {0}")]
    Unauthorized(String),

    #[error("News provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<NewsClientError> for SentimentError {
    fn from(err: NewsClientError) -> Self {
        match err {
            NewsClientError::RateLimited(msg) => SentimentError::RateLimited(msg),
            other => SentimentError::UpstreamUnavailable(other.to_string()),
        }
    }
}
