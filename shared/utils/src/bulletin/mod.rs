//! Bulletin Processing Module
//!
//! Grammar-driven parsing of extracted bulletin text into station records,
//! plus the record checks applied before a snapshot is published.

pub mod number;
pub mod parser;
pub mod validator;

pub use number::{find_date, parse_decimal};
pub use parser::{BulletinParser, ParsedBulletin, DEFAULT_LABELED_PATTERN};
pub use validator::{BulletinValidator, ValidationIssue, ValidationResult, ValidationSeverity};
