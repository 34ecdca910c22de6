//! Request logging, request metrics and response hardening headers.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    http::{HeaderName, HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use super::AppState;
use super::error::ErrorKind;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

const SECURITY_HEADERS: [(&str, &str); 5] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("referrer-policy", "no-referrer"),
    (
        "content-security-policy",
        "default-src 'none'; frame-ancestors 'none'",
    ),
    // Responses carry tokens and account data.
    ("cache-control", "no-store"),
];

pub async fn get_metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.prometheus_handle.as_ref() {
        Some(handle) => (
            [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
            handle.render(),
        )
            .into_response(),
        None => "Metrics recorder not installed".into_response(),
    }
}

/// `ApiError` kind when a handler failed, otherwise the status class.
/// Extractor rejections (malformed JSON and the like) carry no kind.
fn outcome(response: &Response) -> &'static str {
    if let Some(ErrorKind(kind)) = response.extensions().get::<ErrorKind>() {
        return *kind;
    }

    let status = response.status();
    if status.is_server_error() {
        "error"
    } else if status.is_client_error() {
        "rejected"
    } else {
        "success"
    }
}

pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    // Matched route keeps label cardinality bounded.
    let route = req.extensions().get::<MatchedPath>().map_or_else(
        || req.uri().path().to_string(),
        |path| path.as_str().to_string(),
    );

    let span = info_span!(
        "request",
        request_id = %Uuid::new_v4(),
        method = %method,
        route = %route,
        account_id = tracing::field::Empty,
    );

    async move {
        let response = next.run(req).await;
        let elapsed = start.elapsed();
        let status = response.status().as_u16();
        let outcome = outcome(&response);

        let labels = [
            ("method", method.to_string()),
            ("route", route),
            ("outcome", outcome.to_string()),
        ];
        metrics::counter!("http_requests_total", &labels).increment(1);
        metrics::histogram!("http_request_duration_seconds", &labels)
            .record(elapsed.as_secs_f64());

        let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        if response.status().is_server_error() {
            warn!(status, outcome, duration_ms, "Request failed");
        } else {
            info!(status, outcome, duration_ms, "Request finished");
        }

        response
    }
    .instrument(span)
    .await
}

pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    for (name, value) in SECURITY_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    response
}
