//! JSON session-file data adapter.
//!
//! Reads the collector's on-disk layout: one directory per session date,
//! one file per instrument:
//! `{base}/{YYYYMMDD}/stock_data_{code}_{YYYYMMDD}.json`.

use crate::domain::bar::{BarSeries, PriceBar};
use crate::domain::error::RsitraderError;
use crate::ports::data_port::SessionDataPort;
use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

pub const SESSION_DATE_FORMAT: &str = "%Y%m%d";
const FILE_PREFIX: &str = "stock_data";

// Collector output has drifted between compact and ISO-ish timestamps.
const TIMESTAMP_FORMATS: &[&str] = &["%Y%m%d%H%M%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

#[derive(Debug, Deserialize)]
struct SessionFile {
    stock_code: String,
    data: Vec<RawBar>,
}

#[derive(Debug, Deserialize)]
struct RawBar {
    #[serde(rename = "localDateTime")]
    local_date_time: String,
    #[serde(rename = "currentPrice")]
    current_price: Option<f64>,
    #[serde(rename = "openPrice")]
    open_price: Option<f64>,
    #[serde(rename = "highPrice")]
    high_price: Option<f64>,
    #[serde(rename = "lowPrice")]
    low_price: Option<f64>,
}

pub struct JsonDataAdapter {
    base_path: PathBuf,
}

impl JsonDataAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn session_dir(&self, date: NaiveDate) -> PathBuf {
        self.base_path.join(date.format(SESSION_DATE_FORMAT).to_string())
    }

    fn session_path(&self, code: &str, date: NaiveDate) -> PathBuf {
        let date_str = date.format(SESSION_DATE_FORMAT);
        self.session_dir(date)
            .join(format!("{}_{}_{}.json", FILE_PREFIX, code, date_str))
    }

    fn parse_timestamp(raw: &str, context: &str) -> Result<NaiveDateTime, RsitraderError> {
        for format in TIMESTAMP_FORMATS {
            if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
                return Ok(ts);
            }
        }
        Err(RsitraderError::Data {
            context: context.to_string(),
            reason: format!("unrecognized timestamp '{}'", raw),
        })
    }

    fn build_bar(raw: &RawBar, context: &str) -> Result<PriceBar, RsitraderError> {
        let timestamp = Self::parse_timestamp(&raw.local_date_time, context)?;
        let close = raw.current_price.ok_or_else(|| RsitraderError::Data {
            context: context.to_string(),
            reason: format!("missing currentPrice at {}", raw.local_date_time),
        })?;
        if close <= 0.0 {
            return Err(RsitraderError::Data {
                context: context.to_string(),
                reason: format!("non-positive currentPrice {} at {}", close, raw.local_date_time),
            });
        }
        Ok(PriceBar {
            timestamp,
            open: raw.open_price,
            high: raw.high_price,
            low: raw.low_price,
            close,
        })
    }
}

impl SessionDataPort for JsonDataAdapter {
    fn fetch_session(&self, code: &str, date: NaiveDate) -> Result<BarSeries, RsitraderError> {
        let path = self.session_path(code, date);
        if !path.exists() {
            return Err(RsitraderError::NoData {
                code: code.to_string(),
                date: date.format(SESSION_DATE_FORMAT).to_string(),
            });
        }

        let content = fs::read_to_string(&path).map_err(|e| RsitraderError::Storage {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        let file: SessionFile =
            serde_json::from_str(&content).map_err(|e| RsitraderError::Storage {
                reason: format!("failed to parse {}: {}", path.display(), e),
            })?;

        if file.stock_code != code {
            return Err(RsitraderError::Data {
                context: path.display().to_string(),
                reason: format!("file claims code {}, expected {}", file.stock_code, code),
            });
        }

        let context = path.display().to_string();
        let mut bars = Vec::with_capacity(file.data.len());
        for raw in &file.data {
            bars.push(Self::build_bar(raw, &context)?);
        }
        bars.sort_by_key(|b| b.timestamp);

        let series = BarSeries::new(code.to_string(), date, bars);
        if !series.is_well_formed() {
            return Err(RsitraderError::Data {
                context,
                reason: "duplicate bar timestamps".to_string(),
            });
        }
        Ok(series)
    }

    fn fetch_prior_session(
        &self,
        code: &str,
        date: NaiveDate,
        max_lookback_days: u32,
    ) -> Result<Option<BarSeries>, RsitraderError> {
        for back in 1..=u64::from(max_lookback_days) {
            let Some(candidate) = date.checked_sub_days(Days::new(back)) else {
                break;
            };
            if self.session_path(code, candidate).exists() {
                return self.fetch_session(code, candidate).map(Some);
            }
        }
        Ok(None)
    }

    fn list_codes(&self, date: NaiveDate) -> Result<Vec<String>, RsitraderError> {
        let dir = self.session_dir(date);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&dir).map_err(|e| RsitraderError::Storage {
            reason: format!("failed to read directory {}: {}", dir.display(), e),
        })?;

        let prefix = format!("{}_", FILE_PREFIX);
        let suffix = format!("_{}.json", date.format(SESSION_DATE_FORMAT));
        let mut codes = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| RsitraderError::Storage {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if name_str.starts_with(&prefix) && name_str.ends_with(&suffix) {
                let code = &name_str[prefix.len()..name_str.len() - suffix.len()];
                if !code.is_empty() {
                    codes.push(code.to_string());
                }
            }
        }

        codes.sort();
        Ok(codes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_session(base: &std::path::Path, code: &str, date_str: &str, body: &str) {
        let dir = base.join(date_str);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(format!("stock_data_{}_{}.json", code, date_str)),
            body,
        )
        .unwrap();
    }

    fn sample_body(code: &str, date_str: &str) -> String {
        format!(
            r#"{{
  "stock_code": "{code}",
  "date": "{date_str}",
  "data": [
    {{"localDateTime": "{date_str}091000", "currentPrice": 1010.0,
      "openPrice": 1000.0, "highPrice": 1015.0, "lowPrice": 995.0}},
    {{"localDateTime": "{date_str}090000", "currentPrice": 1000.0,
      "openPrice": 990.0, "highPrice": 1005.0, "lowPrice": 985.0}},
    {{"localDateTime": "{date_str}092000", "currentPrice": 1020.0,
      "openPrice": null, "highPrice": 1025.0, "lowPrice": 1005.0}}
  ]
}}"#
        )
    }

    fn setup() -> (TempDir, JsonDataAdapter) {
        let dir = TempDir::new().unwrap();
        let base = dir.path().to_path_buf();

        write_session(&base, "226950", "20250718", &sample_body("226950", "20250718"));
        write_session(&base, "226950", "20250715", &sample_body("226950", "20250715"));
        write_session(&base, "005930", "20250718", &sample_body("005930", "20250718"));

        let adapter = JsonDataAdapter::new(base);
        (dir, adapter)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn fetch_session_sorts_bars_by_timestamp() {
        let (_dir, adapter) = setup();
        let series = adapter.fetch_session("226950", date(2025, 7, 18)).unwrap();

        assert_eq!(series.code, "226950");
        assert_eq!(series.len(), 3);
        assert_eq!(series.bars[0].close, 1000.0);
        assert_eq!(series.bars[1].close, 1010.0);
        assert_eq!(series.bars[2].close, 1020.0);
        assert!(series.is_well_formed());
    }

    #[test]
    fn fetch_session_keeps_absent_fields_as_none() {
        let (_dir, adapter) = setup();
        let series = adapter.fetch_session("226950", date(2025, 7, 18)).unwrap();

        assert_eq!(series.bars[0].open, Some(990.0));
        assert_eq!(series.bars[2].open, None);
        assert_eq!(series.bars[2].high, Some(1025.0));
    }

    #[test]
    fn fetch_session_missing_file_is_no_data() {
        let (_dir, adapter) = setup();
        let err = adapter
            .fetch_session("226950", date(2025, 7, 19))
            .unwrap_err();
        assert!(matches!(err, RsitraderError::NoData { .. }));
    }

    #[test]
    fn fetch_session_rejects_missing_close() {
        let dir = TempDir::new().unwrap();
        write_session(
            dir.path(),
            "226950",
            "20250718",
            r#"{"stock_code": "226950", "date": "20250718",
               "data": [{"localDateTime": "20250718090000", "currentPrice": null,
                         "openPrice": 100.0, "highPrice": 101.0, "lowPrice": 99.0}]}"#,
        );
        let adapter = JsonDataAdapter::new(dir.path().to_path_buf());

        let err = adapter
            .fetch_session("226950", date(2025, 7, 18))
            .unwrap_err();
        assert!(matches!(err, RsitraderError::Data { .. }));
        assert!(err.to_string().contains("currentPrice"));
    }

    #[test]
    fn fetch_session_rejects_mismatched_code() {
        let dir = TempDir::new().unwrap();
        write_session(
            dir.path(),
            "226950",
            "20250718",
            &sample_body("005930", "20250718"),
        );
        let adapter = JsonDataAdapter::new(dir.path().to_path_buf());

        let err = adapter
            .fetch_session("226950", date(2025, 7, 18))
            .unwrap_err();
        assert!(matches!(err, RsitraderError::Data { .. }));
    }

    #[test]
    fn prior_session_skips_days_without_files() {
        let (_dir, adapter) = setup();
        // 2025-07-18 is a Friday; the 16th and 17th have no files.
        let prior = adapter
            .fetch_prior_session("226950", date(2025, 7, 18), 7)
            .unwrap();
        assert_eq!(prior.unwrap().date, date(2025, 7, 15));
    }

    #[test]
    fn prior_session_outside_window_is_none() {
        let (_dir, adapter) = setup();
        let prior = adapter
            .fetch_prior_session("226950", date(2025, 7, 18), 2)
            .unwrap();
        assert!(prior.is_none());
    }

    #[test]
    fn list_codes_scans_the_session_directory() {
        let (_dir, adapter) = setup();
        let codes = adapter.list_codes(date(2025, 7, 18)).unwrap();
        assert_eq!(codes, vec!["005930", "226950"]);

        let codes = adapter.list_codes(date(2025, 7, 15)).unwrap();
        assert_eq!(codes, vec!["226950"]);
    }

    #[test]
    fn list_codes_missing_directory_is_empty() {
        let (_dir, adapter) = setup();
        let codes = adapter.list_codes(date(2024, 1, 1)).unwrap();
        assert!(codes.is_empty());
    }
}
