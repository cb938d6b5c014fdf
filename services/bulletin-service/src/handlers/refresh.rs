use axum::{extract::State, response::Json};
use cote_utils::CoteError;
use std::sync::Arc;

use super::{api_error, ApiError};
use crate::scheduler::{SchedulerStatus, TickOutcome};
use crate::AppState;

/// Runs the pipeline now and waits for the result. Skipped when a run is
/// already in flight.
///
/// POST /api/v1/refresh
pub async fn trigger_refresh(State(state): State<AppState>) -> Result<Json<TickOutcome>, ApiError> {
    // Detached so a client hanging up cannot cancel the run midway
    let scheduler = Arc::clone(&state.scheduler);
    let outcome = tokio::spawn(async move { scheduler.tick().await })
        .await
        .map_err(|e| api_error(CoteError::internal(format!("Refresh task failed: {}", e))))?;

    Ok(Json(outcome))
}

/// GET /api/v1/scheduler
pub async fn get_scheduler_status(State(state): State<AppState>) -> Json<SchedulerStatus> {
    Json(state.scheduler.status().await)
}
