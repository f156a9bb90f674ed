use super::*;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap};
use sentiment_core::{NewsArticle, Sentiment, SentimentResult, Symbol};
use sentiment_orchestrator::OrchestratorConfig;
use serde_json::Value;
use tower::ServiceExt;

const SYMBOLS: &str = r#"[
    {"symbol": "TCS", "name": "Tata Consultancy Services", "exchange": "NSE"},
    {"symbol": "INFY", "name": "Infosys", "exchange": "NSE"},
    {"symbol": "TATAMOTORS", "name": "Tata Motors", "exchange": "NSE"}
]"#;

struct FailingNews(SentimentError);

#[async_trait]
impl NewsSource for FailingNews {
    async fn fetch(&self, _symbol: &Symbol) -> SentimentResult<Vec<NewsArticle>> {
        Err(self.0.clone())
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

struct UnsureClassifier;

#[async_trait]
impl SentimentClassifier for UnsureClassifier {
    async fn classify(&self, _headline: &str) -> SentimentResult<Sentiment> {
        Err(SentimentError::Classification("reply was \"maybe\"".into()))
    }

    fn name(&self) -> &'static str {
        "unsure"
    }
}

fn state_with(news: Arc<dyn NewsSource>, classifier: Arc<dyn SentimentClassifier>) -> AppState {
    let config = ServerConfig::from_lookup(|_| None).unwrap();
    let orchestrator_config = OrchestratorConfig {
        retry_backoff: std::time::Duration::from_millis(1),
        ..config.orchestrator_config()
    };

    AppState {
        orchestrator: Arc::new(SentimentOrchestrator::new(news, classifier, orchestrator_config)),
        symbols: Arc::new(KnownSymbols::from_json_str(SYMBOLS).unwrap()),
        config: Arc::new(config),
    }
}

fn demo_app() -> Router {
    build_router(state_with(
        Arc::new(DemoNewsSource::new(3)),
        Arc::new(KeywordClassifier::new()),
    ))
}

fn post_symbol(symbol: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/news-sentiment")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::json!({ "symbol": symbol }).to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, body)
}

#[tokio::test]
async fn test_root_banner_and_middleware_headers() {
    let app = demo_app();
    let (status, headers, body) = send(&app, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["docs"], "/docs");
    assert!(body["message"].as_str().unwrap().contains("running"));
    assert!(headers.contains_key("x-request-id"));
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["cache-control"], "no-store");
}

#[tokio::test]
async fn test_request_id_propagated() {
    let app = demo_app();
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "trace-abc-123")
        .body(Body::empty())
        .unwrap();

    let (_, headers, _) = send(&app, request).await;
    assert_eq!(headers["x-request-id"], "trace-abc-123");
}

#[tokio::test]
async fn test_post_resolves_then_serves_cache() {
    let app = demo_app();

    let (status, _, body) = send(&app, post_symbol(" tcs ")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let data = &body["data"];
    assert_eq!(data["symbol"], "TCS");
    assert_eq!(data["cached"], false);
    assert_eq!(data["headlines"].as_array().unwrap().len(), 3);
    let breakdown = &data["breakdown"];
    let total = breakdown["positive"].as_u64().unwrap()
        + breakdown["negative"].as_u64().unwrap()
        + breakdown["neutral"].as_u64().unwrap();
    assert_eq!(total, 3);
    assert!(["positive", "negative", "neutral"].contains(&data["overall_sentiment"].as_str().unwrap()));

    let (status, _, again) = send(&app, post_symbol("TCS")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["data"]["cached"], true);
    assert_eq!(again["data"]["timestamp"], data["timestamp"]);
    assert_eq!(again["data"]["headlines"], data["headlines"]);
}

#[tokio::test]
async fn test_unknown_symbol_gets_suggestions() {
    let app = demo_app();

    let (status, _, body) = send(&app, post_symbol("tata")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(
        body["details"]["suggestions"],
        serde_json::json!(["TCS (Tata Consultancy Services)", "TATAMOTORS (Tata Motors)"])
    );

    let (status, _, body) = send(&app, post_symbol("WIPRO")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["provided_symbol"], "WIPRO");
    assert_eq!(body["details"]["example_valid_symbols"][0], "TCS");
}

#[tokio::test]
async fn test_malformed_symbol_rejected() {
    let app = demo_app();
    for symbol in ["", "M&M", "BAJAJ-AUTO"] {
        let (status, _, body) = send(&app, post_symbol(symbol)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{symbol:?}");
        assert!(body["error"].as_str().unwrap().contains("Invalid symbol"));
    }
}

#[tokio::test]
async fn test_bad_request_body_uses_error_envelope() {
    let app = demo_app();
    let bodies = [
        ("application/json", "{\"symbol\": "),
        ("application/json", "{\"ticker\": \"TCS\"}"),
        ("text/plain", "TCS"),
    ];

    for (content_type, raw) in bodies {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/news-sentiment")
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(raw))
            .unwrap();

        let (status, _, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{raw:?}");
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
    }
}

#[tokio::test]
async fn test_cached_lookup_never_fetches() {
    let app = demo_app();

    let (status, _, body) = send(&app, get("/api/v1/news-sentiment/infy")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    send(&app, post_symbol("INFY")).await;

    let (status, _, body) = send(&app, get("/api/v1/news-sentiment/infy")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["symbol"], "INFY");
    assert_eq!(body["data"]["cached"], true);

    let (status, _, _) = send(&app, get("/api/v1/news-sentiment/UNKNOWN")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_valid_symbols_listing() {
    let app = demo_app();
    let (status, _, body) = send(&app, get("/api/v1/valid-symbols")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_count"], 3);
    assert_eq!(body["data"]["valid_symbols"][1]["symbol"], "INFY");
}

#[tokio::test]
async fn test_health_reports_cache_occupancy() {
    let app = demo_app();
    send(&app, post_symbol("TCS")).await;

    let (status, _, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["news_source"], "demo");
    assert_eq!(body["classifier"], "keyword");
    assert_eq!(body["cached_symbols"], 1);
    assert_eq!(body["in_flight"], 0);
    assert_eq!(body["known_symbols"], 3);
}

#[tokio::test]
async fn test_upstream_failures_map_to_status() {
    let cases = [
        (SentimentError::RateLimited("quota".into()), StatusCode::TOO_MANY_REQUESTS),
        (SentimentError::UpstreamUnavailable("down".into()), StatusCode::SERVICE_UNAVAILABLE),
    ];

    for (err, expected) in cases {
        let app = build_router(state_with(Arc::new(FailingNews(err)), Arc::new(KeywordClassifier::new())));
        let (status, _, body) = send(&app, post_symbol("TCS")).await;
        assert_eq!(status, expected);
        assert_eq!(body["success"], false);
    }

    let app = build_router(state_with(Arc::new(DemoNewsSource::new(3)), Arc::new(UnsureClassifier)));
    let (status, _, body) = send(&app, post_symbol("TCS")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("maybe"));
}

#[test]
fn test_error_status_mapping() {
    let status = |err| AppError::from_sentiment(err).status();
    assert_eq!(status(SentimentError::InvalidSymbol("x".into())), StatusCode::BAD_REQUEST);
    assert_eq!(status(SentimentError::Classification("x".into())), StatusCode::BAD_GATEWAY);
    assert_eq!(status(SentimentError::Cancelled), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        status(SentimentError::CacheCorruption("x".into())),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn test_openapi_lists_routes() {
    let doc = ApiDoc::openapi();
    for path in ["/health", "/api/v1/news-sentiment", "/api/v1/news-sentiment/{symbol}", "/api/v1/valid-symbols"] {
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }
}
