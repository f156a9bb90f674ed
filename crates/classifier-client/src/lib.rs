pub mod error;
pub mod sentiment;

pub use error::{ClassifierError, ClassifierResult};
pub use sentiment::{parse_label, OpenAiClassifier};

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Configuration for the chat-completions classifier
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    /// Reply budget; a single word is all that is needed
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl ClassifierConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 10,
            temperature: 0.1,
            timeout: Duration::from_secs(10),
        }
    }
}
