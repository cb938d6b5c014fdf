//! Bulletin Text Parser
//!
//! Turns the plain text of a water-level bulletin into station records.
//! Lines that do not match the configured grammar are skipped; a bulletin
//! with no matching line at all is a [`ParseError`].

use chrono::NaiveDate;
use cote_models::{DatedReading, MeasurementRecord};
use regex::{Captures, Regex};

use super::number::{find_date, parse_day_month, parse_decimal};
use crate::config::{BulletinLayout, DecimalSeparator, ParserConfig};
use crate::error::{CoteError, ParseError};

/// `Station A: 3,45 m`, `Sulina: 80 cm -12`, `Tulcea: 120 cm 0`.
pub const DEFAULT_LABELED_PATTERN: &str = r"^\s*(?P<station>\p{L}[\p{L}\p{M}\d .'\-]*?)\s*:\s*(?P<value>[+-]?\d[\d.,]*)\s*(?P<unit>[\p{L}°]+)?(?:\s+(?P<variation>[+-]?\d[\d.,]*))?\s*$";

/// `Sulina 0 80 78 75 70` under a `Localitate km 25.01 26.01 ...` header.
const TABULAR_ROW_PATTERN: &str = r"^\s*(?P<station>\p{L}[\p{L}\p{M} .'\-]*?)\s+(?P<km>\d{1,4})\s+(?P<values>[+-]?\d[\d.,]*(?:\s+[+-]?\d[\d.,]*)*)\s*$";

const TABULAR_HEADER_DATE: &str = r"\b\d{1,2}[./]\d{1,2}(?:[./]\d{4})?\b";

/// Records read from one bulletin, in document order.
#[derive(Debug, Clone)]
pub struct ParsedBulletin {
    pub records: Vec<MeasurementRecord>,
    pub bulletin_date: Option<NaiveDate>,
    pub lines_scanned: usize,
    pub lines_skipped: usize,
}

/// Where the tabular scan stands relative to the `Localitate ... km` table.
enum Table {
    /// No header seen yet; rows are accepted as they come.
    Headerless,
    Open(Vec<NaiveDate>),
    /// Only another header reopens it.
    Closed,
}

enum Grammar {
    Labeled { line: Regex },
    Tabular { row: Regex, header_date: Regex },
}

/// Line-oriented bulletin parser.
pub struct BulletinParser {
    grammar: Grammar,
    decimal_separator: DecimalSeparator,
    default_unit: String,
}

impl BulletinParser {
    pub fn from_config(config: &ParserConfig) -> Result<Self, CoteError> {
        let grammar = match config.layout {
            BulletinLayout::Labeled => {
                let pattern = config
                    .line_pattern
                    .as_deref()
                    .unwrap_or(DEFAULT_LABELED_PATTERN);
                Grammar::Labeled {
                    line: compile_line_pattern(pattern)?,
                }
            }
            BulletinLayout::Tabular => Grammar::Tabular {
                row: Regex::new(TABULAR_ROW_PATTERN)?,
                header_date: Regex::new(TABULAR_HEADER_DATE)?,
            },
        };

        Ok(Self {
            grammar,
            decimal_separator: config.decimal_separator,
            default_unit: config.default_unit.trim().to_string(),
        })
    }

    /// Parses `text`. `reference_date` resolves header dates printed without a year.
    pub fn parse(&self, text: &str, reference_date: NaiveDate) -> Result<ParsedBulletin, ParseError> {
        let bulletin_date = find_date(text);
        let mut lines_scanned = 0;
        let mut records = Vec::new();
        let mut table = Table::Headerless;

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            lines_scanned += 1;

            let record = match &self.grammar {
                Grammar::Labeled { line: pattern } => pattern
                    .captures(line)
                    .and_then(|cap| self.labeled_record(&cap, bulletin_date)),
                Grammar::Tabular { row, header_date } => {
                    if is_table_header(line) {
                        let year_hint = bulletin_date.unwrap_or(reference_date);
                        let column_dates: Vec<NaiveDate> = header_date
                            .find_iter(line)
                            .filter_map(|m| parse_day_month(m.as_str(), year_hint))
                            .collect();
                        tracing::debug!(columns = column_dates.len(), "Found bulletin table header");
                        table = Table::Open(column_dates);
                        None
                    } else {
                        let record = match &table {
                            Table::Headerless => row
                                .captures(line)
                                .and_then(|cap| self.tabular_record(&cap, &[], bulletin_date)),
                            Table::Open(column_dates) => row
                                .captures(line)
                                .and_then(|cap| self.tabular_record(&cap, column_dates, bulletin_date)),
                            Table::Closed => None,
                        };
                        if record.is_none() && matches!(table, Table::Open(_)) {
                            tracing::debug!(line, "Bulletin table ended");
                            table = Table::Closed;
                        }
                        record
                    }
                }
            };

            match record {
                Some(record) => records.push(record),
                None => tracing::trace!(line, "Skipping unrecognised bulletin line"),
            }
        }

        let lines_skipped = lines_scanned - records.len();
        if records.is_empty() {
            return Err(ParseError::NoRecords {
                lines_scanned,
                lines_skipped,
            });
        }

        Ok(ParsedBulletin {
            records,
            bulletin_date,
            lines_scanned,
            lines_skipped,
        })
    }

    fn labeled_record(&self, cap: &Captures<'_>, bulletin_date: Option<NaiveDate>) -> Option<MeasurementRecord> {
        let station = clean_station(cap.name("station")?.as_str())?;
        let value = parse_decimal(cap.name("value")?.as_str(), self.decimal_separator)?;
        let unit = cap
            .name("unit")
            .map(|m| m.as_str().trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| self.default_unit.clone());

        // A variation or km that does not parse drops the whole line
        let variation = match cap.name("variation") {
            Some(m) => Some(parse_decimal(m.as_str(), self.decimal_separator)?),
            None => None,
        };
        let km = match cap.name("km") {
            Some(m) => Some(m.as_str().trim().parse::<u32>().ok()?),
            None => None,
        };
        let observed_on = cap
            .name("date")
            .and_then(|m| find_date(m.as_str()))
            .or(bulletin_date);

        Some(
            MeasurementRecord::new(station, value, unit)
                .with_km(km)
                .with_variation(variation)
                .with_observed_on(observed_on),
        )
    }

    fn tabular_record(
        &self,
        cap: &Captures<'_>,
        column_dates: &[NaiveDate],
        bulletin_date: Option<NaiveDate>,
    ) -> Option<MeasurementRecord> {
        let station = clean_station(cap.name("station")?.as_str())?;
        let km = cap.name("km")?.as_str().parse::<u32>().ok()?;
        let readings: Vec<f64> = cap
            .name("values")?
            .as_str()
            .split_whitespace()
            .map(|raw| parse_decimal(raw, self.decimal_separator))
            .collect::<Option<Vec<_>>>()?;

        let (&current, earlier) = readings.split_last()?;
        let variation = earlier.last().map(|previous| current - previous);
        let observed_on = column_dates.last().copied().or(bulletin_date);

        // Short rows fill the right-most columns
        let offset = column_dates.len().checked_sub(readings.len());
        let series = readings
            .iter()
            .enumerate()
            .map(|(i, &value)| DatedReading {
                date: offset.and_then(|o| column_dates.get(o + i).copied()),
                value,
            })
            .collect();

        Some(
            MeasurementRecord::new(station, current, self.default_unit.clone())
                .with_km(Some(km))
                .with_variation(variation)
                .with_observed_on(observed_on)
                .with_readings(series),
        )
    }
}

fn compile_line_pattern(pattern: &str) -> Result<Regex, CoteError> {
    let regex = Regex::new(pattern)?;
    for required in ["station", "value"] {
        if !regex.capture_names().flatten().any(|name| name == required) {
            return Err(CoteError::configuration(format!(
                "parser.line_pattern must define a `{}` group",
                required
            )));
        }
    }
    Ok(regex)
}

fn is_table_header(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("localitate") && lower.split_whitespace().any(|word| word == "km")
}

fn clean_station(raw: &str) -> Option<String> {
    let station = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if station.is_empty() {
        None
    } else {
        Some(station)
    }
}
