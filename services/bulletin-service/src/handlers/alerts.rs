use axum::{extract::State, response::Json};
use chrono::{DateTime, Utc};
use cote_models::StationAlert;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertsResponse {
    pub updated_at: Option<DateTime<Utc>>,
    pub alerts: Vec<StationAlert>,
}

/// Stations at or above their attention or flood level, flood first
///
/// GET /api/v1/alerts
pub async fn get_alerts(State(state): State<AppState>) -> Json<AlertsResponse> {
    let read = state.cache.read().await;
    let Some(snapshot) = read.snapshot() else {
        return Json(AlertsResponse {
            updated_at: None,
            alerts: Vec::new(),
        });
    };

    Json(AlertsResponse {
        updated_at: Some(snapshot.updated_at),
        alerts: StationAlert::collect(&snapshot.records, &state.config.alerts.thresholds),
    })
}
