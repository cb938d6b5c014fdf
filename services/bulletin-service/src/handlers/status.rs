//! Snapshot Handlers
//!
//! Read-only views of the cached bulletin.

use axum::{
    extract::{Path, State},
    response::Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use cote_models::{MeasurementRecord, StatusView, Trend};
use cote_utils::CoteError;
use serde::Serialize;

use super::{api_error, ApiError};
use crate::cache::CacheRead;
use crate::AppState;

/// Latest records and the time they were published
///
/// GET /status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusView> {
    match state.cache.read().await {
        CacheRead::Empty => Json(StatusView::pending()),
        CacheRead::Ready(snapshot) => Json(StatusView::from(snapshot.as_ref())),
    }
}

/// One station, matched ignoring case and diacritics
///
/// GET /api/v1/stations/:name
pub async fn get_station(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<MeasurementRecord>, ApiError> {
    let CacheRead::Ready(snapshot) = state.cache.read().await else {
        return Err(api_error(CoteError::not_found(format!(
            "station {} (no bulletin loaded yet)",
            name
        ))));
    };

    snapshot
        .find_station(&name)
        .cloned()
        .map(Json)
        .ok_or_else(|| api_error(CoteError::not_found(format!("station {}", name))))
}

#[derive(Debug, Serialize)]
pub struct StationLevel {
    pub station: String,
    pub value: f64,
    pub unit: String,
}

impl From<&MeasurementRecord> for StationLevel {
    fn from(record: &MeasurementRecord) -> Self {
        Self {
            station: record.station.clone(),
            value: record.value,
            unit: record.unit.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub count: usize,
    pub updated_at: Option<DateTime<Utc>>,
    pub bulletin_date: Option<NaiveDate>,
    pub stale_seconds: Option<i64>,
    pub stale: bool,
    pub highest: Option<StationLevel>,
    pub lowest: Option<StationLevel>,
    pub rising: usize,
    pub falling: usize,
    pub stable: usize,
}

/// GET /api/v1/summary
pub async fn get_summary(State(state): State<AppState>) -> Json<SummaryResponse> {
    let snapshot = match state.cache.read().await {
        CacheRead::Empty => {
            return Json(SummaryResponse {
                count: 0,
                updated_at: None,
                bulletin_date: None,
                stale_seconds: None,
                stale: true,
                highest: None,
                lowest: None,
                rising: 0,
                falling: 0,
                stable: 0,
            })
        }
        CacheRead::Ready(snapshot) => snapshot,
    };

    let stale_seconds = snapshot.staleness_seconds(state.clock.now());
    let count_trend = |trend: Trend| {
        snapshot
            .records
            .iter()
            .filter(|r| r.trend == Some(trend))
            .count()
    };

    Json(SummaryResponse {
        count: snapshot.len(),
        updated_at: Some(snapshot.updated_at),
        bulletin_date: snapshot.bulletin_date,
        stale_seconds: Some(stale_seconds),
        stale: stale_seconds > state.config.scheduler.stale_after_seconds as i64,
        highest: snapshot.highest().map(StationLevel::from),
        lowest: snapshot.lowest().map(StationLevel::from),
        rising: count_trend(Trend::Rising),
        falling: count_trend(Trend::Falling),
        stable: count_trend(Trend::Stable),
    })
}
