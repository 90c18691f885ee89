use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;

use super::AppState;

#[derive(Serialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Serialize)]
struct ComponentCheck {
    status: ComponentStatus,
    message: String,
    latency_ms: u64,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    status: ComponentStatus,
    checks: HashMap<&'static str, ComponentCheck>,
    timestamp: String,
}

pub async fn health_summary(state: web::Data<AppState>) -> HttpResponse {
    match state.maintenance.health_check().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "blog-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("store check failed: {}", e),
            "service": "blog-service"
        })),
    }
}

/// Store failures make the service unready; a cache failure only degrades
/// it, since the home page renders fresh without one.
pub async fn readiness(state: web::Data<AppState>) -> HttpResponse {
    let mut checks = HashMap::new();

    let start = Instant::now();
    let store = state.maintenance.health_check().await;
    let latency_ms = start.elapsed().as_millis() as u64;
    let ready = store.is_ok();
    checks.insert(
        "store",
        match store {
            Ok(()) => ComponentCheck {
                status: ComponentStatus::Healthy,
                message: "store reachable".to_string(),
                latency_ms,
            },
            Err(e) => ComponentCheck {
                status: ComponentStatus::Unhealthy,
                message: format!("store check failed: {}", e),
                latency_ms,
            },
        },
    );

    let start = Instant::now();
    let cache = state.home_cache.ping().await;
    let latency_ms = start.elapsed().as_millis() as u64;
    let cache_ok = cache.is_ok();
    checks.insert(
        "cache",
        match cache {
            Ok(()) => ComponentCheck {
                status: ComponentStatus::Healthy,
                message: "cache ping successful".to_string(),
                latency_ms,
            },
            Err(e) => ComponentCheck {
                status: ComponentStatus::Degraded,
                message: format!("cache ping failed: {}", e),
                latency_ms,
            },
        },
    );

    let status = match (ready, cache_ok) {
        (false, _) => ComponentStatus::Unhealthy,
        (true, false) => ComponentStatus::Degraded,
        (true, true) => ComponentStatus::Healthy,
    };

    let response = ReadinessResponse {
        ready,
        status,
        checks,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "alive" }))
}
