//! INI file configuration adapter.

use crate::domain::error::RsitraderError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RsitraderError> {
        let mut config = Ini::new();
        config
            .load(path.as_ref())
            .map_err(|e| RsitraderError::ConfigParse {
                file: path.as_ref().display().to_string(),
                reason: e,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, RsitraderError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|e| RsitraderError::ConfigParse {
                file: "<inline>".to_string(),
                reason: e,
            })?;
        Ok(Self { config })
    }

    /// Empty configuration; every lookup falls back to its default.
    pub fn empty() -> Self {
        Self { config: Ini::new() }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_str(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_i64(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_f64(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn from_string_parses_sections() {
        let content = r#"
[trade]
buy_price_type = open
slippage = 0.002

[simulation]
initial_capital = 10000000
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_str("trade", "buy_price_type"),
            Some("open".to_string())
        );
        assert_eq!(adapter.get_f64("trade", "slippage", 0.0), 0.002);
        assert_eq!(
            adapter.get_f64("simulation", "initial_capital", 0.0),
            10_000_000.0
        );
    }

    #[test]
    fn get_str_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[trade]\nslippage = 0.0\n").unwrap();
        assert_eq!(adapter.get_str("trade", "missing"), None);
        assert_eq!(adapter.get_str("missing_section", "key"), None);
    }

    #[test]
    fn get_i64_returns_default_for_missing_or_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[rsi]\nperiod = abc\n").unwrap();
        assert_eq!(adapter.get_i64("rsi", "period", 14), 14);
        assert_eq!(adapter.get_i64("rsi", "missing", 14), 14);
    }

    #[test]
    fn get_i64_returns_value() {
        let adapter = FileConfigAdapter::from_string("[rsi]\nperiod = 9\n").unwrap();
        assert_eq!(adapter.get_i64("rsi", "period", 14), 9);
    }

    #[test]
    fn get_f64_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[trade]\n").unwrap();
        assert_eq!(adapter.get_f64("trade", "slippage", 0.5), 0.5);
    }

    #[test]
    fn empty_config_uses_defaults_everywhere() {
        let adapter = FileConfigAdapter::empty();
        assert_eq!(adapter.get_str("trade", "buy_price_type"), None);
        assert_eq!(adapter.get_i64("rsi", "period", 14), 14);
        assert_eq!(adapter.get_f64("trade", "slippage", 0.0), 0.0);
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[data]\nbase_path = /var/lib/rsitrader/data\n").unwrap();

        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_str("data", "base_path"),
            Some("/var/lib/rsitrader/data".to_string())
        );
    }

    #[test]
    fn from_file_missing_file_is_config_parse_error() {
        let err = FileConfigAdapter::from_file("/nonexistent/rsitrader.ini").unwrap_err();
        assert!(matches!(err, RsitraderError::ConfigParse { .. }));
    }
}
