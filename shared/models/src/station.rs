//! Station thresholds and level alerts.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::measurement::{MeasurementRecord, Trend};

/// Lowercases, trims, collapses whitespace and folds Romanian diacritics,
/// so `"Galați"`, `"GALATI"` and `" galaţi "` compare equal.
pub fn normalize_station_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'ă' | 'â' => 'a',
            'î' => 'i',
            'ș' | 'ş' => 's',
            'ț' | 'ţ' => 't',
            other => other,
        })
        .collect()
}

/// Attention and flood levels for a station, in centimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct StationThreshold {
    #[validate(length(min = 1, message = "Station name is required"))]
    pub station: String,
    pub attention_cm: f64,
    pub flood_cm: f64,
}

impl StationThreshold {
    pub fn new(station: impl Into<String>, attention_cm: f64, flood_cm: f64) -> Self {
        Self {
            station: station.into(),
            attention_cm,
            flood_cm,
        }
    }

    pub fn matches(&self, station: &str) -> bool {
        normalize_station_name(&self.station) == normalize_station_name(station)
    }

    /// Highest level reached by `level_cm`, if any.
    pub fn level_for(&self, level_cm: f64) -> Option<(AlertLevel, f64)> {
        if level_cm >= self.flood_cm {
            Some((AlertLevel::Flood, self.flood_cm))
        } else if level_cm >= self.attention_cm {
            Some((AlertLevel::Attention, self.attention_cm))
        } else {
            None
        }
    }
}

/// Reference levels published by the Lower Danube river administration
/// for the main Romanian ports.
pub fn default_danube_thresholds() -> Vec<StationThreshold> {
    vec![
        StationThreshold::new("Sulina", 250.0, 300.0),
        StationThreshold::new("Tulcea", 550.0, 600.0),
        StationThreshold::new("Isaccea", 550.0, 600.0),
        StationThreshold::new("Galați", 650.0, 720.0),
        StationThreshold::new("Brăila", 650.0, 720.0),
        StationThreshold::new("Hârșova", 650.0, 720.0),
        StationThreshold::new("Cernavodă", 550.0, 620.0),
        StationThreshold::new("Călărași", 700.0, 780.0),
        StationThreshold::new("Oltenița", 600.0, 680.0),
        StationThreshold::new("Giurgiu", 650.0, 750.0),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Attention,
    Flood,
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Attention => write!(f, "attention"),
            Self::Flood => write!(f, "flood"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationAlert {
    pub station: String,
    pub level: AlertLevel,
    pub value_cm: f64,
    pub threshold_cm: f64,
    pub exceedance_cm: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
}

impl StationAlert {
    /// Checks one record against the first matching threshold.
    /// Records without a length unit never alert.
    pub fn evaluate(record: &MeasurementRecord, thresholds: &[StationThreshold]) -> Option<Self> {
        let threshold = thresholds.iter().find(|t| t.matches(&record.station))?;
        let value_cm = record.value_in_cm()?;
        let (level, threshold_cm) = threshold.level_for(value_cm)?;

        Some(Self {
            station: record.station.clone(),
            level,
            value_cm,
            threshold_cm,
            exceedance_cm: value_cm - threshold_cm,
            trend: record.trend,
        })
    }

    /// Alerts for every record, flood before attention, then by exceedance.
    pub fn collect(records: &[MeasurementRecord], thresholds: &[StationThreshold]) -> Vec<Self> {
        let mut alerts: Vec<Self> = records
            .iter()
            .filter_map(|record| Self::evaluate(record, thresholds))
            .collect();

        alerts.sort_by(|a, b| {
            b.level
                .cmp(&a.level)
                .then(b.exceedance_cm.total_cmp(&a.exceedance_cm))
        });
        alerts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_station_name() {
        assert_eq!(normalize_station_name("  Galați "), "galati");
        assert_eq!(normalize_station_name("GALAŢI"), "galati");
        assert_eq!(normalize_station_name("Turnu   Măgurele"), "turnu magurele");
    }

    #[test]
    fn test_threshold_levels() {
        let threshold = StationThreshold::new("Sulina", 250.0, 300.0);
        assert_eq!(threshold.level_for(100.0), None);
        assert_eq!(threshold.level_for(250.0), Some((AlertLevel::Attention, 250.0)));
        assert_eq!(threshold.level_for(320.0), Some((AlertLevel::Flood, 300.0)));
    }

    #[test]
    fn test_alert_uses_metres_conversion() {
        let thresholds = vec![StationThreshold::new("Tulcea", 550.0, 600.0)];
        let record = MeasurementRecord::new("Tulcea", 5.75, "m").with_variation(Some(0.1));

        let alert = StationAlert::evaluate(&record, &thresholds).unwrap();
        assert_eq!(alert.level, AlertLevel::Attention);
        assert!((alert.value_cm - 575.0).abs() < 1e-9);
        assert!((alert.exceedance_cm - 25.0).abs() < 1e-9);
        assert_eq!(alert.trend, Some(Trend::Rising));
    }

    #[test]
    fn test_alerts_sorted_flood_first() {
        let thresholds = default_danube_thresholds();
        let records = vec![
            MeasurementRecord::new("Sulina", 260.0, "cm"),
            MeasurementRecord::new("Galati", 730.0, "cm"),
            MeasurementRecord::new("Giurgiu", 100.0, "cm"),
            MeasurementRecord::new("Unknown", 9999.0, "cm"),
            MeasurementRecord::new("Tulcea", 9.0, "°C"),
        ];

        let alerts = StationAlert::collect(&records, &thresholds);
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].level, AlertLevel::Flood);
        assert_eq!(alerts[0].station, "Galati");
        assert_eq!(alerts[1].station, "Sulina");
    }
}
