use sentiment_core::SentimentError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Rate limited by classifier API")]
    RateLimited,

    #[error("Classifier API rejected credentials")]
    Unauthorized,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unexpected label in model reply: {0:?}")]
    UnexpectedLabel(String),
}

pub type ClassifierResult<T> = Result<T, ClassifierError>;

impl From<ClassifierError> for SentimentError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::InvalidResponse(_) | ClassifierError::UnexpectedLabel(_) => {
                SentimentError::Classification(err.to_string())
            }
            other => SentimentError::UpstreamUnavailable(other.to_string()),
        }
    }
}
