//! Bulletin Record Validator
//!
//! Drops records that cannot be served and flags suspicious ones.

use cote_models::{normalize_station_name, MeasurementRecord};
use std::collections::HashSet;
use validator::Validate;

/// Validation severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationSeverity {
    /// Record is dropped
    Error,
    /// Record is kept and the issue logged
    Warning,
}

/// Single validation issue
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub severity: ValidationSeverity,
    pub index: usize,
    pub station: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub records: Vec<MeasurementRecord>,
    pub issues: Vec<ValidationIssue>,
    pub error_count: usize,
    pub warning_count: usize,
}

impl ValidationResult {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

pub struct BulletinValidator {
    max_abs_value: f64,
}

impl BulletinValidator {
    pub fn new(max_abs_value: f64) -> Self {
        Self { max_abs_value }
    }

    /// Keeps valid records in their original order.
    pub fn validate(&self, records: Vec<MeasurementRecord>) -> ValidationResult {
        let mut issues = Vec::new();
        let mut kept = Vec::with_capacity(records.len());
        let mut seen = HashSet::new();

        for (index, record) in records.into_iter().enumerate() {
            if let Err(e) = record.validate() {
                issues.push(ValidationIssue {
                    severity: ValidationSeverity::Error,
                    index,
                    station: record.station.clone(),
                    message: e.to_string(),
                });
                continue;
            }

            if !record.value.is_finite() {
                issues.push(ValidationIssue {
                    severity: ValidationSeverity::Error,
                    index,
                    station: record.station.clone(),
                    message: "value is not a finite number".to_string(),
                });
                continue;
            }

            if record.value.abs() > self.max_abs_value {
                issues.push(ValidationIssue {
                    severity: ValidationSeverity::Warning,
                    index,
                    station: record.station.clone(),
                    message: format!("value {} exceeds {}", record.value, self.max_abs_value),
                });
            }

            if !seen.insert(normalize_station_name(&record.station)) {
                issues.push(ValidationIssue {
                    severity: ValidationSeverity::Warning,
                    index,
                    station: record.station.clone(),
                    message: "station appears more than once".to_string(),
                });
            }

            kept.push(record);
        }

        let error_count = issues
            .iter()
            .filter(|i| i.severity == ValidationSeverity::Error)
            .count();
        let warning_count = issues.len() - error_count;

        ValidationResult {
            records: kept,
            issues,
            error_count,
            warning_count,
        }
    }
}

impl Default for BulletinValidator {
    fn default() -> Self {
        Self::new(10_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_records_pass() {
        let result = BulletinValidator::default().validate(vec![
            MeasurementRecord::new("Sulina", 80.0, "cm"),
            MeasurementRecord::new("Tulcea", 120.0, "cm"),
        ]);
        assert!(result.is_clean());
        assert_eq!(result.records.len(), 2);
    }

    #[test]
    fn test_errors_drop_records() {
        let result = BulletinValidator::default().validate(vec![
            MeasurementRecord::new("", 80.0, "cm"),
            MeasurementRecord::new("Tulcea", f64::NAN, "cm"),
            MeasurementRecord::new("Galați", 310.0, "cm"),
        ]);
        assert_eq!(result.error_count, 2);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].station, "Galați");
    }

    #[test]
    fn test_warnings_keep_records() {
        let result = BulletinValidator::new(1000.0).validate(vec![
            MeasurementRecord::new("Galați", 310.0, "cm"),
            MeasurementRecord::new("GALATI", 311.0, "cm"),
            MeasurementRecord::new("Brăila", 5000.0, "cm"),
        ]);
        assert_eq!(result.warning_count, 2);
        assert_eq!(result.error_count, 0);
        assert_eq!(result.records.len(), 3);
        assert_eq!(result.issues[0].index, 1);
    }
}
