use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};

/// Prefix of the Swagger UI, which needs scripts and styles to render
const DOCS_PREFIX: &str = "/docs";

/// Standard hardening headers for every response.
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let serves_docs = request.uri().path().starts_with(DOCS_PREFIX);

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert("referrer-policy", HeaderValue::from_static("no-referrer"));

    if !serves_docs {
        // JSON only: nothing to load, nothing for intermediaries to keep
        headers.insert(
            "content-security-policy",
            HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
        );
        headers.insert("cache-control", HeaderValue::from_static("no-store"));
    }

    response
}
