use async_trait::async_trait;
use reqwest::StatusCode;
use sentiment_core::{Sentiment, SentimentClassifier, SentimentResult};
use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, ClassifierResult};
use crate::ClassifierConfig;

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Headline classifier backed by an OpenAI-compatible chat-completions API
#[derive(Clone)]
pub struct OpenAiClassifier {
    client: reqwest::Client,
    config: ClassifierConfig,
}

impl OpenAiClassifier {
    pub fn new(config: ClassifierConfig) -> ClassifierResult<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn prompt(headline: &str) -> String {
        format!(
            r#"Analyze the sentiment of this financial news headline about an Indian stock.

Headline: "{headline}"

Instructions:
- Consider financial and market context
- Focus on impact on stock price/company performance
- Return ONLY one word: positive, negative, or neutral
- Positive: Good news for the company/stock (growth, profits, upgrades, deals, etc.)
- Negative: Bad news for the company/stock (losses, downgrades, problems, etc.)
- Neutral: Factual reporting without clear positive/negative impact

Response:"#
        )
    }

    /// Send one prompt and return the raw reply text.
    async fn complete(&self, prompt: &str) -> ClassifierResult<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::TOO_MANY_REQUESTS => return Err(ClassifierError::RateLimited),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(ClassifierError::Unauthorized),
            status => {
                return Err(ClassifierError::ServiceUnavailable(format!(
                    "Status: {}",
                    status
                )))
            }
        }

        let body = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| ClassifierError::InvalidResponse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ClassifierError::InvalidResponse("reply had no content".to_string()))
    }

    pub async fn classify_headline(&self, headline: &str) -> ClassifierResult<Sentiment> {
        if headline.trim().is_empty() {
            return Ok(Sentiment::Neutral);
        }

        let reply = self.complete(&Self::prompt(headline)).await?;
        let sentiment = parse_label(&reply)?;
        tracing::debug!("Classified {:?} as {}", headline, sentiment);
        Ok(sentiment)
    }
}

/// Pick the first whole-word sentiment label out of a model reply.
pub fn parse_label(reply: &str) -> ClassifierResult<Sentiment> {
    let lower = reply.to_lowercase();
    lower
        .split(|c: char| !c.is_ascii_alphabetic())
        .find_map(|word| match word {
            "positive" => Some(Sentiment::Positive),
            "negative" => Some(Sentiment::Negative),
            "neutral" => Some(Sentiment::Neutral),
            _ => None,
        })
        .ok_or_else(|| ClassifierError::UnexpectedLabel(reply.trim().to_string()))
}

#[async_trait]
impl SentimentClassifier for OpenAiClassifier {
    async fn classify(&self, headline: &str) -> SentimentResult<Sentiment> {
        Ok(self.classify_headline(headline).await?)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
