//! Locale-aware numbers and dates as printed in bulletins.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

use crate::config::DecimalSeparator;

/// Parses a number written with the given decimal convention.
///
/// With [`DecimalSeparator::Comma`] `3,45` is 3.45 and `1.234,5` is 1234.5;
/// with [`DecimalSeparator::Point`] the roles swap. Thousands separators are
/// only accepted between groups of three digits, so `28.01.2026` is rejected
/// rather than read as a large number.
pub fn parse_decimal(raw: &str, separator: DecimalSeparator) -> Option<f64> {
    let raw = raw.trim();
    let (sign, digits) = match raw.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, raw.strip_prefix('+').unwrap_or(raw)),
    };

    let (integer, fraction) = match digits.split_once(separator.as_char()) {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (digits, None),
    };

    let integer = strip_thousands(integer, separator.thousands())?;
    let normalized = match fraction {
        Some(fraction) if !fraction.is_empty() && fraction.chars().all(|c| c.is_ascii_digit()) => {
            format!("{}.{}", integer, fraction)
        }
        Some(_) => return None,
        None => integer,
    };

    normalized
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(|value| sign * value)
}

fn strip_thousands(integer: &str, thousands: char) -> Option<String> {
    let groups: Vec<&str> = integer.split(thousands).collect();
    let first = groups.first()?;

    if first.is_empty() || first.len() > 3 && groups.len() > 1 {
        return None;
    }
    if !groups.iter().all(|g| g.chars().all(|c| c.is_ascii_digit())) {
        return None;
    }
    if groups.iter().skip(1).any(|g| g.len() != 3) {
        return None;
    }

    Some(groups.concat())
}

fn date_regex() -> &'static Regex {
    static DATE: OnceLock<Regex> = OnceLock::new();
    DATE.get_or_init(|| {
        Regex::new(r"\b(\d{1,2})[./](\d{1,2})[./](\d{4})\b").expect("date pattern is valid")
    })
}

/// First full `dd.mm.yyyy` or `dd/mm/yyyy` date in the text.
pub fn find_date(text: &str) -> Option<NaiveDate> {
    date_regex().captures_iter(text).find_map(|cap| {
        let day = cap[1].parse().ok()?;
        let month = cap[2].parse().ok()?;
        let year = cap[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    })
}

/// Parses a `dd.mm` column header, picking the year that keeps the date
/// at most a month after `reference`.
pub fn parse_day_month(raw: &str, reference: NaiveDate) -> Option<NaiveDate> {
    if let Some(date) = find_date(raw) {
        return Some(date);
    }

    let (day, month) = raw.trim().split_once(['.', '/'])?;
    let day: u32 = day.parse().ok()?;
    let month: u32 = month.trim_end_matches('.').parse().ok()?;

    let candidate = NaiveDate::from_ymd_opt(reference.year(), month, day)?;
    if candidate > reference + chrono::Duration::days(31) {
        NaiveDate::from_ymd_opt(reference.year() - 1, month, day)
    } else {
        Some(candidate)
    }
}
