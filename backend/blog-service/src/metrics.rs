//! Prometheus metrics for the blog service.
//!
//! Collectors register with the default registry on first use; `serve_metrics`
//! renders them for the `/metrics` endpoint.

use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

/// Home page cache events (hit/miss/error/invalidate).
pub static HOME_CACHE_EVENTS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "blog_home_cache_events_total",
        "Home page cache events segmented by outcome",
        &["event"]
    )
    .expect("failed to register blog_home_cache_events_total")
});

/// Follow/unfollow attempts by outcome.
pub static FOLLOW_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "blog_follow_outcomes_total",
        "Follow graph writes segmented by operation and outcome",
        &["operation", "outcome"]
    )
    .expect("failed to register blog_follow_outcomes_total")
});

/// Requests by method, matched route pattern and status.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "blog_http_requests_total",
        "HTTP requests segmented by method, route and status",
        &["method", "route", "status"]
    )
    .expect("failed to register blog_http_requests_total")
});

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
