//! Metrics middleware for API routes.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::metrics::{
    normalize_path, HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION,
    IMPORT_REQUESTS_TOTAL,
};

/// Normalized route of `POST /imports/{tenant_id}`.
const IMPORT_START_PATH: &str = "/api/v1/imports/{tenant_id}";

/// Records request latency, counts and in-flight requests for every route,
/// and the outcome of import start requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let path = normalize_path(request.uri().path());
    let is_import_start = *request.method() == Method::POST && path == IMPORT_START_PATH;
    let method = request.method().to_string();

    HTTP_REQUESTS_IN_FLIGHT.inc();
    let response = next.run(request).await;
    HTTP_REQUESTS_IN_FLIGHT.dec();

    let status = response.status();
    let status_label = status.as_u16().to_string();

    HTTP_REQUEST_DURATION
        .with_label_values(&[&method, &path, &status_label])
        .observe(start.elapsed().as_secs_f64());
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status_label])
        .inc();

    if is_import_start {
        IMPORT_REQUESTS_TOTAL
            .with_label_values(&[import_outcome(status)])
            .inc();
    }

    response
}

/// Outcome label for an import start response.
pub fn import_outcome(status: StatusCode) -> &'static str {
    match status {
        StatusCode::ACCEPTED => "accepted",
        StatusCode::SERVICE_UNAVAILABLE => "unavailable",
        s if s.is_client_error() => "rejected",
        _ => "error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_outcome_labels() {
        assert_eq!(import_outcome(StatusCode::ACCEPTED), "accepted");
        assert_eq!(import_outcome(StatusCode::SERVICE_UNAVAILABLE), "unavailable");
        assert_eq!(import_outcome(StatusCode::METHOD_NOT_ALLOWED), "rejected");
        assert_eq!(import_outcome(StatusCode::INTERNAL_SERVER_ERROR), "error");
    }
}
