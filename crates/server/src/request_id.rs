use std::time::Instant;

use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlate every request with an `X-Request-ID`.
///
/// Propagates the incoming header when present, mints a UUID otherwise,
/// logs start/end with elapsed milliseconds, and echoes the id on the
/// response so clients can quote it back.
pub async fn request_id_layer(req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    log::info!("request start: {method} {path} request_id={request_id}");

    let started = Instant::now();
    let mut response = next.run(req).await;
    let elapsed_ms = started.elapsed().as_millis();

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    log::info!(
        "request end: {method} {path} status={} elapsed_ms={elapsed_ms} request_id={request_id}",
        response.status().as_u16()
    );
    response
}
