//! HTTP surface for the news sentiment service.

use anyhow::Context;
use axum::{
    http::{Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    Json, Router,
};
use classifier_client::{ClassifierConfig, OpenAiClassifier};
use news_client::{DemoNewsSource, GoogleNewsClient, NewsClientConfig};
use sentiment_analysis::KeywordClassifier;
use sentiment_core::{NewsSource, SentimentClassifier, SentimentError};
use sentiment_orchestrator::SentimentOrchestrator;
use serde::Serialize;
use std::sync::Arc;
use symbol_validation::KnownSymbols;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod config;
pub mod health_routes;
pub mod news_routes;
pub mod request_id;
pub mod security_headers;

pub use config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<SentimentOrchestrator>,
    pub symbols: Arc<KnownSymbols>,
    pub config: Arc<ServerConfig>,
}

/// Envelope for every JSON response
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Handler error: a status code plus the underlying cause, with optional
/// structured details for the client.
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
    details: Option<serde_json::Value>,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: anyhow::Error) -> Self {
        Self {
            status,
            error,
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Map a resolution failure onto its HTTP status.
    pub fn from_sentiment(err: SentimentError) -> Self {
        let status = match &err {
            SentimentError::InvalidSymbol(_) => StatusCode::BAD_REQUEST,
            SentimentError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            SentimentError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            SentimentError::Classification(_) => StatusCode::BAD_GATEWAY,
            SentimentError::CacheCorruption(_) | SentimentError::Cancelled => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::with_status(status, err.into())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed ({}): {:#}", self.status, self.error);
        } else {
            tracing::debug!("Request rejected ({}): {:#}", self.status, self.error);
        }

        let mut body = serde_json::json!({
            "success": false,
            "error": self.error.to_string(),
        });
        if let Some(details) = self.details {
            body["details"] = details;
        }

        (self.status, Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, err.into())
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "News Sentiment API",
        description = "Headline sentiment for NSE/BSE listed companies"
    ),
    paths(
        health_routes::root,
        health_routes::health,
        news_routes::analyze_news_sentiment,
        news_routes::get_cached_sentiment,
        news_routes::list_valid_symbols,
    ),
    components(schemas(
        news_routes::NewsSentimentRequest,
        news_routes::NewsSentimentResponse,
        news_routes::ValidSymbolsResponse,
        health_routes::ServiceInfo,
        health_routes::HealthResponse,
        sentiment_core::Headline,
        sentiment_core::Sentiment,
        sentiment_analysis::SentimentTally,
        symbol_validation::StockInfo,
    )),
    tags(
        (name = "News Sentiment", description = "Headline sentiment per symbol"),
        (name = "System", description = "Service status")
    )
)]
pub struct ApiDoc;

/// Wire up the upstream clients (or their offline fallbacks) and the cache.
pub fn build_state(config: ServerConfig) -> anyhow::Result<AppState> {
    let news: Arc<dyn NewsSource> = match &config.rapidapi_key {
        Some(key) => {
            let mut news_config = NewsClientConfig::new(key.clone());
            news_config.host = config.rapidapi_host.clone();
            news_config.max_articles = config.max_news_articles;
            news_config.rate_limit = config.news_rate_limit;
            Arc::new(GoogleNewsClient::new(news_config).context("Failed to build news client")?)
        }
        None => {
            tracing::warn!("RAPIDAPI_KEY not set; serving demo headlines");
            Arc::new(DemoNewsSource::new(config.max_news_articles))
        }
    };

    let classifier: Arc<dyn SentimentClassifier> = match &config.openai_api_key {
        Some(key) => {
            let mut classifier_config = ClassifierConfig::new(key.clone());
            if let Some(model) = &config.openai_model {
                classifier_config.model = model.clone();
            }
            if let Some(base_url) = &config.openai_base_url {
                classifier_config.base_url = base_url.trim_end_matches('/').to_string();
            }
            let classifier = OpenAiClassifier::new(classifier_config).context("Failed to build classifier client")?;
            tracing::info!("Classifying headlines with {}", classifier.model());
            Arc::new(classifier)
        }
        None => {
            tracing::warn!("OPENAI_API_KEY not set; using keyword classifier");
            Arc::new(KeywordClassifier::new())
        }
    };

    let symbols = KnownSymbols::load_or_empty(&config.symbols_file);
    let orchestrator = SentimentOrchestrator::new(news, classifier, config.orchestrator_config());

    Ok(AppState {
        orchestrator: Arc::new(orchestrator),
        symbols: Arc::new(symbols),
        config: Arc::new(config),
    })
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
        tracing::info_span!(
            "http",
            method = %request.method(),
            uri = %request.uri(),
            request_id = tracing::field::Empty,
        )
    });

    Router::new()
        .merge(health_routes::health_routes())
        .merge(news_routes::news_routes())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(security_headers::security_headers_middleware))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(trace)
        .layer(cors)
        .with_state(state)
}

pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=debug"));

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env()?;
    let addr = config.bind_addr();
    tracing::info!("Starting news sentiment API v{}", env!("CARGO_PKG_VERSION"));

    let state = build_state(config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("API documentation at http://{}/docs", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests;
