//! Metrics middleware for API routes.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::debug;

use crate::metrics::{
    normalize_path, HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION,
};

/// Records every request into the `pixpress_http_*` metrics.
///
/// Labels are `method`, the path after [`normalize_path`] (ids collapse to
/// `{id}`), and the status code. `/convert`, `/process` and `/batch` hold the
/// connection while encoders run, so their durations include subprocess time
/// up to the AVIF timeouts; the histogram's upper buckets exist for them.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());

    HTTP_REQUESTS_IN_FLIGHT.inc();

    let response = next.run(request).await;

    HTTP_REQUESTS_IN_FLIGHT.dec();

    let duration = start.elapsed();
    let status = response.status().as_u16().to_string();

    HTTP_REQUEST_DURATION
        .with_label_values(&[&method, &path, &status])
        .observe(duration.as_secs_f64());
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();
    debug!(
        method = %method,
        path = %path,
        status = %status,
        duration_ms = duration.as_millis() as u64,
        "Request handled"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, http::StatusCode, middleware, routing::get, Router};
    use tower::ServiceExt;

    async fn stats_handler() -> &'static str {
        "{}"
    }

    async fn batch_handler(Path(_id): Path<String>) -> &'static str {
        "{}"
    }

    fn app() -> Router {
        Router::new()
            .route("/api/v1/stats", get(stats_handler))
            .route("/api/v1/batches/{id}", get(batch_handler))
            .layer(middleware::from_fn(metrics_middleware))
    }

    async fn send(app: Router, uri: &str) -> StatusCode {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        app.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_metrics_middleware_counts_requests() {
        let before = HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/api/v1/stats", "200"])
            .get();

        assert_eq!(send(app(), "/api/v1/stats").await, StatusCode::OK);

        let after = HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/api/v1/stats", "200"])
            .get();
        assert_eq!(after, before + 1);
    }

    #[tokio::test]
    async fn test_batch_ids_share_one_label() {
        let label = ["GET", "/api/v1/batches/{id}", "200"];
        let before = HTTP_REQUESTS_TOTAL.with_label_values(&label).get();

        for id in [
            "550e8400-e29b-41d4-a716-446655440000",
            "6ba7b810-9dad-11d1-80b4-00c04fd430c8",
        ] {
            let uri = format!("/api/v1/batches/{}", id);
            assert_eq!(send(app(), &uri).await, StatusCode::OK);
        }

        let after = HTTP_REQUESTS_TOTAL.with_label_values(&label).get();
        assert_eq!(after, before + 2);
    }
}
