use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use cote_utils::CoteError;
use serde_json::{json, Value};

use super::{api_error, ApiError};
use crate::cache::CacheRead;
use crate::state_machine::SchedulerState;
use crate::AppState;

/// Always 200; `degraded` means there is no data yet or it is stale.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let now = state.clock.now();
    let scheduler = state.scheduler.status().await;

    let mut health_status = json!({
        "status": "healthy",
        "service": "cote-bulletin-service",
        "timestamp": now.to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {}
    });

    let stale_after = state.config.scheduler.stale_after_seconds as i64;
    let snapshot_status = match state.cache.read().await {
        CacheRead::Empty => json!({"status": "unhealthy", "message": "No bulletin loaded yet"}),
        CacheRead::Ready(snapshot) => {
            let stale_seconds = snapshot.staleness_seconds(now);
            let status = if stale_seconds > stale_after { "unhealthy" } else { "healthy" };
            json!({
                "status": status,
                "records": snapshot.len(),
                "updatedAt": snapshot.updated_at,
                "staleSeconds": stale_seconds,
            })
        }
    };
    health_status["checks"]["snapshot"] = snapshot_status;

    let last_error = scheduler
        .last_error
        .as_ref()
        .map(|e| json!({"stage": e.stage, "message": e.message, "at": e.at}));
    let scheduler_health = if scheduler.state == SchedulerState::IdleWithError {
        "unhealthy"
    } else {
        "healthy"
    };
    health_status["checks"]["scheduler"] = json!({
        "status": scheduler_health,
        "state": scheduler.state,
        "lastSuccessAt": scheduler.last_success_at,
        "lastError": last_error,
    });

    // A failed last run only degrades the service once the data goes stale
    if health_status["checks"]["snapshot"]["status"] != "healthy" {
        health_status["status"] = json!("degraded");
    }

    Json(health_status)
}

/// Prometheus text exposition
///
/// GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let body = state
        .metrics
        .render()
        .map_err(|e| api_error(CoteError::internal(format!("Failed to encode metrics: {}", e))))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
        body,
    ))
}
