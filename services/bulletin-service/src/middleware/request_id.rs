use axum::{
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Reuses a caller-supplied `x-request-id` or assigns a fresh UUID, and
/// echoes it on the response.
pub async fn request_id_middleware(mut request: Request<axum::body::Body>, next: Next) -> Response {
    let existing = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .filter(|v| !v.is_empty())
        .cloned();

    let request_id = match existing {
        Some(value) => value,
        None => {
            let value = HeaderValue::from_str(&Uuid::new_v4().to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("unknown"));
            request.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
            value
        }
    };

    let span = tracing::info_span!(
        "request",
        request_id = %request_id.to_str().unwrap_or("invalid"),
        method = %request.method(),
        path = %request.uri().path(),
    );

    let mut response = next.run(request).instrument(span).await;
    response.headers_mut().insert(REQUEST_ID_HEADER, request_id);
    response
}
