pub mod config;
pub mod logging;
pub mod error;
pub mod bulletin;

pub use self::config::*;
pub use self::logging::*;
pub use self::error::*;
pub use self::bulletin::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_loading() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.source.url, DEFAULT_BULLETIN_URL);
    }

    #[test]
    fn test_error_handling() {
        let error = CoteError::not_found("station Foo");
        assert_eq!(error.error_code(), "NOT_FOUND");
        assert_eq!(error.http_status_code(), 404);
    }

    #[test]
    fn test_parser_from_default_config() {
        let config = AppConfig::default();
        let parser = BulletinParser::from_config(&config.parser).unwrap();
        let today = chrono::NaiveDate::from_ymd_opt(2026, 1, 28).unwrap();
        let parsed = parser.parse("Sulina: 80 cm\n", today).unwrap();
        assert_eq!(parsed.records.len(), 1);
    }
}
