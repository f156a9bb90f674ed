//! News Sentiment Routes
//!
//! Resolve headline sentiment for a symbol, read the last cached result, and
//! list the symbols the service recognizes.

use anyhow::anyhow;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use sentiment_analysis::SentimentTally;
use sentiment_core::{CacheEntry, Headline, Sentiment, Symbol, SymbolValidator};
use serde::{Deserialize, Serialize};
use symbol_validation::StockInfo;
use utoipa::ToSchema;

use crate::{ApiResponse, AppError, AppState};

/// Shown when an unknown symbol has no close match
const EXAMPLE_SYMBOLS: [&str; 4] = ["TCS", "RELIANCE", "INFY", "HDFCBANK"];

const MAX_SUGGESTIONS: usize = 3;

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewsSentimentRequest {
    /// NSE/BSE symbol, any case (e.g. "tcs")
    #[schema(example = "TCS")]
    pub symbol: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NewsSentimentResponse {
    pub symbol: Symbol,
    /// When the headlines were fetched and classified
    pub timestamp: DateTime<Utc>,
    pub headlines: Vec<Headline>,
    pub overall_sentiment: Sentiment,
    /// True when served from cache
    pub cached: bool,
    pub breakdown: SentimentTally,
}

impl NewsSentimentResponse {
    pub fn from_entry(entry: &CacheEntry, cached: bool) -> Self {
        Self {
            symbol: entry.symbol.clone(),
            timestamp: entry.created_at,
            headlines: entry.headlines.clone(),
            overall_sentiment: entry.overall_sentiment,
            cached,
            breakdown: SentimentTally::from_sentiments(entry.sentiments()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ValidSymbolsResponse {
    pub valid_symbols: Vec<StockInfo>,
    pub total_count: usize,
}

pub fn news_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/news-sentiment", post(analyze_news_sentiment))
        .route("/api/v1/news-sentiment/:symbol", get(get_cached_sentiment))
        .route("/api/v1/valid-symbols", get(list_valid_symbols))
}

/// Normalize and check a symbol against the known list.
fn recognized_symbol(state: &AppState, raw: &str) -> Result<Symbol, AppError> {
    let symbol = Symbol::parse(raw).map_err(AppError::from_sentiment)?;
    if state.symbols.is_recognized(&symbol) {
        return Ok(symbol);
    }

    let suggestions = state.symbols.suggestions(symbol.as_str(), MAX_SUGGESTIONS);
    let details = if suggestions.is_empty() {
        serde_json::json!({ "provided_symbol": raw, "example_valid_symbols": EXAMPLE_SYMBOLS })
    } else {
        serde_json::json!({ "provided_symbol": raw, "suggestions": suggestions })
    };

    Err(AppError::with_status(
        StatusCode::BAD_REQUEST,
        anyhow!("'{}' is not a valid NSE/BSE listed company symbol", symbol),
    )
    .with_details(details))
}

/// Fetch and classify headlines for a symbol (served from cache when fresh)
#[utoipa::path(
    post,
    path = "/api/v1/news-sentiment",
    request_body = NewsSentimentRequest,
    responses(
        (status = 200, description = "Headlines with sentiment", body = NewsSentimentResponse),
        (status = 400, description = "Malformed body, invalid or unknown symbol"),
        (status = 429, description = "News provider rate limit reached"),
        (status = 502, description = "Classifier returned an unusable label"),
        (status = 503, description = "Upstream unavailable")
    ),
    tag = "News Sentiment"
)]
pub async fn analyze_news_sentiment(
    State(state): State<AppState>,
    request: Result<Json<NewsSentimentRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<NewsSentimentResponse>>, AppError> {
    let Json(request) = request.map_err(|rejection| {
        AppError::with_status(
            StatusCode::BAD_REQUEST,
            anyhow!("Invalid request body: {}", rejection.body_text()),
        )
    })?;
    let symbol = recognized_symbol(&state, &request.symbol)?;

    let resolution = state
        .orchestrator
        .resolve_symbol(&symbol)
        .await
        .map_err(AppError::from_sentiment)?;

    Ok(Json(ApiResponse::success(NewsSentimentResponse::from_entry(
        &resolution.entry,
        resolution.was_cached,
    ))))
}

/// Most recent cached result within the lookback window; never fetches
#[utoipa::path(
    get,
    path = "/api/v1/news-sentiment/{symbol}",
    params(("symbol" = String, Path, description = "NSE/BSE symbol")),
    responses(
        (status = 200, description = "Cached headlines with sentiment", body = NewsSentimentResponse),
        (status = 400, description = "Invalid or unknown symbol"),
        (status = 404, description = "Nothing cached for this symbol")
    ),
    tag = "News Sentiment"
)]
pub async fn get_cached_sentiment(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<NewsSentimentResponse>>, AppError> {
    let symbol = recognized_symbol(&state, &symbol)?;
    let lookback = Duration::minutes(state.config.cached_lookback_minutes);

    let entry = state
        .orchestrator
        .peek(symbol.as_str(), lookback)
        .map_err(AppError::from_sentiment)?
        .ok_or_else(|| {
            AppError::with_status(
                StatusCode::NOT_FOUND,
                anyhow!("No cached data found for symbol: {}", symbol),
            )
        })?;

    Ok(Json(ApiResponse::success(NewsSentimentResponse::from_entry(&entry, true))))
}

/// Every symbol the service recognizes
#[utoipa::path(
    get,
    path = "/api/v1/valid-symbols",
    responses((status = 200, description = "Known symbols", body = ValidSymbolsResponse)),
    tag = "News Sentiment"
)]
pub async fn list_valid_symbols(State(state): State<AppState>) -> Json<ApiResponse<ValidSymbolsResponse>> {
    let valid_symbols = state.symbols.stocks().to_vec();
    Json(ApiResponse::success(ValidSymbolsResponse {
        total_count: valid_symbols.len(),
        valid_symbols,
    }))
}
