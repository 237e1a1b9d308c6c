//! Configuration validation.
//!
//! Validates all config fields before a session is built.

use crate::domain::error::TraderError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DATA_SOURCES: &[&str] = &["csv", "json", "http"];

pub fn validate_session_config(config: &dyn ConfigPort) -> Result<(), TraderError> {
    validate_starting_capital(config)?;
    validate_initial_reveal(config)?;
    validate_period_list(config, "ma_periods")?;
    validate_period_list(config, "window_presets")?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), TraderError> {
    validate_source(config)?;
    validate_dates(config)?;
    validate_symbols(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> TraderError {
    TraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_starting_capital(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let Some(raw) = config.get_string("session", "starting_capital") else {
        return Ok(());
    };
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(()),
        Ok(_) => Err(invalid(
            "session",
            "starting_capital",
            "starting_capital must be positive",
        )),
        Err(_) => Err(invalid(
            "session",
            "starting_capital",
            format!("'{}' is not a number", raw),
        )),
    }
}

fn validate_initial_reveal(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let Some(raw) = config.get_string("session", "initial_reveal") else {
        return Ok(());
    };
    match raw.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(()),
        _ => Err(invalid(
            "session",
            "initial_reveal",
            "initial_reveal must be a positive integer",
        )),
    }
}

fn validate_period_list(config: &dyn ConfigPort, key: &str) -> Result<(), TraderError> {
    match config.get_usize_list("session", key) {
        None => Ok(()),
        Some(Err(entry)) => Err(invalid(
            "session",
            key,
            format!("'{}' is not a positive integer", entry),
        )),
        Some(Ok(list)) if list.is_empty() => {
            Err(invalid("session", key, format!("{} must not be empty", key)))
        }
        Some(Ok(list)) if list.contains(&0) => Err(invalid(
            "session",
            key,
            format!("{} entries must be at least 1", key),
        )),
        Some(Ok(_)) => Ok(()),
    }
}

fn validate_source(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let Some(source) = config.get_string("data", "source") else {
        return Ok(());
    };
    let source = source.to_ascii_lowercase();
    if !DATA_SOURCES.contains(&source.as_str()) {
        return Err(invalid(
            "data",
            "source",
            format!("unknown source '{}', expected csv, json or http", source),
        ));
    }
    if source != "http" && config.get_string("data", "path").is_none() {
        return Err(TraderError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        });
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let start = parse_optional_date(config, "start_date")?;
    let end = parse_optional_date(config, "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(invalid(
                "data",
                "start_date",
                "start_date must be before end_date",
            ));
        }
    }
    Ok(())
}

/// Parse `[data] <key>` as `YYYY-MM-DD`; a missing key is `None`.
pub fn parse_optional_date(
    config: &dyn ConfigPort,
    key: &str,
) -> Result<Option<NaiveDate>, TraderError> {
    config
        .get_string("data", key)
        .map(|s| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| {
                invalid(
                    "data",
                    key,
                    format!("invalid {} format, expected YYYY-MM-DD", key),
                )
            })
        })
        .transpose()
}

fn validate_symbols(config: &dyn ConfigPort) -> Result<(), TraderError> {
    match config.get_string("data", "symbols") {
        Some(s) if s.split(',').any(|sym| sym.trim().is_empty()) => Err(invalid(
            "data",
            "symbols",
            "symbols must be a comma-separated list of non-empty symbols",
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MockConfig {
        values: HashMap<(String, String), String>,
    }

    impl MockConfig {
        fn new() -> Self {
            Self {
                values: HashMap::new(),
            }
        }

        fn set(mut self, section: &str, key: &str, value: &str) -> Self {
            self.values
                .insert((section.to_string(), key.to_string()), value.to_string());
            self
        }
    }

    impl ConfigPort for MockConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.values
                .get(&(section.to_string(), key.to_string()))
                .cloned()
        }

        fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }
    }

    fn assert_invalid(result: Result<(), TraderError>, expected_key: &str) {
        match result {
            Err(TraderError::ConfigInvalid { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("expected ConfigInvalid for {}, got {:?}", expected_key, other),
        }
    }

    #[test]
    fn empty_session_config_uses_defaults() {
        assert!(validate_session_config(&MockConfig::new()).is_ok());
    }

    #[test]
    fn full_session_config_is_valid() {
        let config = MockConfig::new()
            .set("session", "starting_capital", "50000")
            .set("session", "initial_reveal", "150")
            .set("session", "ma_periods", "5,10")
            .set("session", "window_presets", "100,250");
        assert!(validate_session_config(&config).is_ok());
    }

    #[test]
    fn zero_capital_rejected() {
        let config = MockConfig::new().set("session", "starting_capital", "0");
        assert_invalid(validate_session_config(&config), "starting_capital");
    }

    #[test]
    fn negative_capital_rejected() {
        let config = MockConfig::new().set("session", "starting_capital", "-10");
        assert_invalid(validate_session_config(&config), "starting_capital");
    }

    #[test]
    fn non_numeric_capital_rejected() {
        let config = MockConfig::new().set("session", "starting_capital", "lots");
        assert_invalid(validate_session_config(&config), "starting_capital");
    }

    #[test]
    fn zero_initial_reveal_rejected() {
        let config = MockConfig::new().set("session", "initial_reveal", "0");
        assert_invalid(validate_session_config(&config), "initial_reveal");
    }

    #[test]
    fn zero_ma_period_rejected() {
        let config = MockConfig::new().set("session", "ma_periods", "5,0,20");
        assert_invalid(validate_session_config(&config), "ma_periods");
    }

    #[test]
    fn bad_window_preset_rejected() {
        let config = MockConfig::new().set("session", "window_presets", "200,big");
        assert_invalid(validate_session_config(&config), "window_presets");
    }

    #[test]
    fn http_source_needs_no_path() {
        let config = MockConfig::new().set("data", "source", "http");
        assert!(validate_data_config(&config).is_ok());
    }

    #[test]
    fn file_source_requires_path() {
        let config = MockConfig::new().set("data", "source", "csv");
        match validate_data_config(&config) {
            Err(TraderError::ConfigMissing { key, .. }) => assert_eq!(key, "path"),
            other => panic!("expected ConfigMissing, got {:?}", other),
        }
    }

    #[test]
    fn unknown_source_rejected() {
        let config = MockConfig::new().set("data", "source", "ftp");
        assert_invalid(validate_data_config(&config), "source");
    }

    #[test]
    fn start_after_end_rejected() {
        let config = MockConfig::new()
            .set("data", "start_date", "2021-01-01")
            .set("data", "end_date", "2020-01-01");
        assert_invalid(validate_data_config(&config), "start_date");
    }

    #[test]
    fn malformed_date_rejected() {
        let config = MockConfig::new().set("data", "end_date", "2020/01/01");
        assert_invalid(validate_data_config(&config), "end_date");
    }

    #[test]
    fn blank_symbol_entry_rejected() {
        let config = MockConfig::new().set("data", "symbols", "AAPL,,MSFT");
        assert_invalid(validate_data_config(&config), "symbols");
    }

    #[test]
    fn parse_optional_date_missing_is_none() {
        assert_eq!(parse_optional_date(&MockConfig::new(), "start_date").unwrap(), None);
    }
}
