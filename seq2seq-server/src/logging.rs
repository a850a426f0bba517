//! Request logging middleware.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::router::REQUEST_TYPE_HEADER;

/// Middleware that logs HTTP requests at INFO level, including the detected
/// protocol for inference calls.
pub async fn request_logger(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let status = response.status();
    let duration = start.elapsed();
    let protocol = response
        .headers()
        .get(REQUEST_TYPE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    tracing::info!(
        method = %method,
        path = %path,
        status = %status.as_u16(),
        protocol = %protocol,
        duration_ms = %duration.as_millis(),
        "HTTP request"
    );

    response
}
