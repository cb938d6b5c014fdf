use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::measurement::MeasurementRecord;

/// Records produced by one successful pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub records: Vec<MeasurementRecord>,
    pub updated_at: DateTime<Utc>,
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bulletin_date: Option<NaiveDate>,
}

impl Snapshot {
    pub fn new(records: Vec<MeasurementRecord>, updated_at: DateTime<Utc>, source_url: impl Into<String>) -> Self {
        Self {
            records,
            updated_at,
            source_url: source_url.into(),
            bulletin_date: None,
        }
    }

    pub fn with_bulletin_date(mut self, bulletin_date: Option<NaiveDate>) -> Self {
        self.bulletin_date = bulletin_date;
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Age of the snapshot in whole seconds; never negative.
    pub fn staleness_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.updated_at).num_seconds().max(0)
    }

    pub fn find_station(&self, name: &str) -> Option<&MeasurementRecord> {
        let wanted = crate::station::normalize_station_name(name);
        self.records
            .iter()
            .find(|record| crate::station::normalize_station_name(&record.station) == wanted)
    }

    pub fn highest(&self) -> Option<&MeasurementRecord> {
        self.records
            .iter()
            .max_by(|a, b| a.value.total_cmp(&b.value))
    }

    pub fn lowest(&self) -> Option<&MeasurementRecord> {
        self.records
            .iter()
            .min_by(|a, b| a.value.total_cmp(&b.value))
    }
}

/// Payload of `GET /status`. `updated_at` is null until the first successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub records: Vec<MeasurementRecord>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl StatusView {
    pub fn pending() -> Self {
        Self {
            records: Vec::new(),
            updated_at: None,
        }
    }
}

impl From<&Snapshot> for StatusView {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            records: snapshot.records.clone(),
            updated_at: Some(snapshot.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Snapshot {
        let at = Utc.with_ymd_and_hms(2026, 1, 28, 9, 0, 0).unwrap();
        Snapshot::new(
            vec![
                MeasurementRecord::new("Sulina", 80.0, "cm"),
                MeasurementRecord::new("Galați", 310.0, "cm"),
                MeasurementRecord::new("Tulcea", 120.0, "cm"),
            ],
            at,
            "https://example.test/bhcote.pdf",
        )
    }

    #[test]
    fn test_pending_status_serializes_null_timestamp() {
        let json = serde_json::to_value(StatusView::pending()).unwrap();
        assert_eq!(json, serde_json::json!({ "records": [], "updatedAt": null }));
    }

    #[test]
    fn test_highest_and_lowest() {
        let snapshot = sample();
        assert_eq!(snapshot.highest().unwrap().station, "Galați");
        assert_eq!(snapshot.lowest().unwrap().station, "Sulina");
    }

    #[test]
    fn test_find_station_ignores_case_and_diacritics() {
        let snapshot = sample();
        assert_eq!(snapshot.find_station("galati").unwrap().value, 310.0);
        assert!(snapshot.find_station("Braila").is_none());
    }

    #[test]
    fn test_staleness_is_clamped() {
        let snapshot = sample();
        let earlier = snapshot.updated_at - chrono::Duration::minutes(5);
        let later = snapshot.updated_at + chrono::Duration::minutes(5);
        assert_eq!(snapshot.staleness_seconds(earlier), 0);
        assert_eq!(snapshot.staleness_seconds(later), 300);
    }
}
