use config::{Config, ConfigError, Environment, File};
use cote_models::{default_danube_thresholds, StationThreshold};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use validator::Validate;

use crate::error::CoteError;

pub const DEFAULT_BULLETIN_URL: &str = "https://www.afdj.ro/sites/default/files/bhcote.pdf";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub source: SourceConfig,
    pub scheduler: SchedulerConfig,
    pub parser: ParserConfig,
    pub alerts: AlertsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub interval_seconds: u64,
    pub retry_delay_seconds: u64,
    pub max_run_seconds: u64,
    pub run_on_start: bool,
    pub stale_after_seconds: u64,
}

/// Line grammar used to read the bulletin text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulletinLayout {
    /// `Station: value unit [variation]`, one record per line.
    Labeled,
    /// `Localitate km dd.mm ...` header followed by `station km v1 .. vN` rows.
    Tabular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecimalSeparator {
    #[serde(rename = ",")]
    Comma,
    #[serde(rename = ".")]
    Point,
}

impl DecimalSeparator {
    pub fn as_char(&self) -> char {
        match self {
            Self::Comma => ',',
            Self::Point => '.',
        }
    }

    pub fn thousands(&self) -> char {
        match self {
            Self::Comma => '.',
            Self::Point => ',',
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub layout: BulletinLayout,
    /// Overrides the built-in `labeled` pattern. Must define `station` and
    /// `value` groups; `unit`, `variation`, `km` and `date` are optional.
    pub line_pattern: Option<String>,
    pub decimal_separator: DecimalSeparator,
    pub default_unit: String,
    pub max_abs_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    pub thresholds: Vec<StationThreshold>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                File::with_name(&format!(
                    "config/{}",
                    env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // Add local config (gitignored)
            .add_source(File::with_name("config/local").required(false))
            // COTE__SCHEDULER__INTERVAL_SECONDS=900 and friends
            .add_source(
                Environment::with_prefix("COTE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        config.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), CoteError> {
        let url = self.source.url.trim();
        if url.is_empty() {
            return Err(CoteError::configuration("source.url must not be empty"));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(CoteError::configuration(format!(
                "source.url must be an http(s) URL, got {}",
                url
            )));
        }
        if self.source.timeout_seconds == 0 {
            return Err(CoteError::configuration("source.timeout_seconds must be positive"));
        }
        if self.scheduler.interval_seconds == 0 {
            return Err(CoteError::configuration("scheduler.interval_seconds must be positive"));
        }
        if self.scheduler.max_run_seconds == 0 {
            return Err(CoteError::configuration("scheduler.max_run_seconds must be positive"));
        }
        if self.parser.default_unit.trim().is_empty() {
            return Err(CoteError::configuration("parser.default_unit must not be empty"));
        }
        for threshold in &self.alerts.thresholds {
            threshold
                .validate()
                .map_err(|e| CoteError::configuration(format!("alerts.thresholds: {}", e)))?;
            if threshold.attention_cm > threshold.flood_cm {
                return Err(CoteError::configuration(format!(
                    "alerts.thresholds: attention level above flood level for {}",
                    threshold.station
                )));
            }
        }
        Ok(())
    }
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    /// Delay before the next attempt after a failed run, never longer than the interval.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_seconds.min(self.interval_seconds))
    }

    pub fn max_run(&self) -> Duration {
        Duration::from_secs(self.max_run_seconds)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_BULLETIN_URL.to_string(),
            timeout_seconds: 30,
            user_agent: format!("cote/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 3600,
            retry_delay_seconds: 300,
            max_run_seconds: 120,
            run_on_start: true,
            stale_after_seconds: 2 * 86400,
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            layout: BulletinLayout::Labeled,
            line_pattern: None,
            decimal_separator: DecimalSeparator::Comma,
            default_unit: "cm".to_string(),
            max_abs_value: 10_000.0,
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            thresholds: default_danube_thresholds(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
            file_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.scheduler.interval(), Duration::from_secs(3600));
        assert_eq!(config.parser.decimal_separator, DecimalSeparator::Comma);
    }

    #[test]
    fn test_retry_delay_capped_by_interval() {
        let scheduler = SchedulerConfig {
            interval_seconds: 60,
            retry_delay_seconds: 600,
            ..SchedulerConfig::default()
        };
        assert_eq!(scheduler.retry_delay(), Duration::from_secs(60));
    }

    #[test]
    fn test_rejects_bad_source() {
        let mut config = AppConfig::default();
        config.source.url = "ftp://example.test/bhcote.pdf".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.scheduler.interval_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let mut config = AppConfig::default();
        config.alerts.thresholds = vec![StationThreshold::new("Sulina", 400.0, 300.0)];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(
                r#"
                [scheduler]
                interval_seconds = 900

                [parser]
                layout = "tabular"
                decimal_separator = "."
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.scheduler.interval_seconds, 900);
        assert_eq!(config.scheduler.retry_delay_seconds, 300);
        assert_eq!(config.parser.layout, BulletinLayout::Tabular);
        assert_eq!(config.parser.decimal_separator, DecimalSeparator::Point);
        assert_eq!(config.source.url, DEFAULT_BULLETIN_URL);
    }
}
