//! Station measurements parsed from a bulletin.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One station reading from one bulletin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementRecord {
    #[validate(length(min = 1, max = 120, message = "Station name is required"))]
    pub station: String,
    pub value: f64,
    #[validate(length(min = 1, max = 16, message = "Unit is required"))]
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_on: Option<NaiveDate>,
    /// Distance from the river mouth, as printed in the bulletin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub km: Option<u32>,
    /// Change since the previous reading, in the record's unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
    /// Every reading printed for the station in this bulletin, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub readings: Vec<DatedReading>,
}

/// One column of a station row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatedReading {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub value: f64,
}

impl MeasurementRecord {
    pub fn new(station: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            station: station.into(),
            value,
            unit: unit.into(),
            observed_on: None,
            km: None,
            variation: None,
            trend: None,
            readings: Vec::new(),
        }
    }

    pub fn with_observed_on(mut self, observed_on: Option<NaiveDate>) -> Self {
        self.observed_on = observed_on;
        self
    }

    pub fn with_km(mut self, km: Option<u32>) -> Self {
        self.km = km;
        self
    }

    pub fn with_readings(mut self, readings: Vec<DatedReading>) -> Self {
        self.readings = readings;
        self
    }

    /// Sets the variation and derives the trend from its sign.
    pub fn with_variation(mut self, variation: Option<f64>) -> Self {
        self.variation = variation;
        self.trend = variation.map(Trend::from_variation);
        self
    }

    /// Level converted to centimetres, when the unit is a length.
    pub fn value_in_cm(&self) -> Option<f64> {
        match self.unit.to_lowercase().as_str() {
            "cm" => Some(self.value),
            "m" => Some(self.value * 100.0),
            "mm" => Some(self.value / 10.0),
            _ => None,
        }
    }
}

/// Direction of the level compared with the previous reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

impl Trend {
    pub fn from_variation(variation: f64) -> Self {
        if variation > 0.0 {
            Self::Rising
        } else if variation < 0.0 {
            Self::Falling
        } else {
            Self::Stable
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rising => write!(f, "rising"),
            Self::Falling => write!(f, "falling"),
            Self::Stable => write!(f, "stable"),
        }
    }
}
