//! JSON report adapter. Pretty-printed, one document per file.

use crate::domain::error::RsitraderError;
use crate::domain::grid::GridSearchResult;
use crate::domain::simulator::SimulationResult;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::fs;
use std::path::Path;

pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self
    }

    fn write_document<T: Serialize>(value: &T, path: &Path) -> Result<(), RsitraderError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json =
            serde_json::to_string_pretty(value).map_err(|e| RsitraderError::Storage {
                reason: format!("failed to serialize report: {}", e),
            })?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl Default for JsonReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for JsonReportAdapter {
    fn write_simulation(
        &self,
        result: &SimulationResult,
        output_path: &Path,
    ) -> Result<(), RsitraderError> {
        Self::write_document(result, output_path)
    }

    fn write_grid(
        &self,
        result: &GridSearchResult,
        output_path: &Path,
    ) -> Result<(), RsitraderError> {
        Self::write_document(result, output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::{BarSeries, PriceBar};
    use crate::domain::execution::ExecutionConfig;
    use crate::domain::grid::{run_grid_search, ThresholdGrid};
    use crate::domain::rsi::{RsiPoint, RsiSeries};
    use crate::domain::simulator::{run_simulation, SimulationParams};
    use chrono::{NaiveDate, NaiveDateTime};
    use tempfile::TempDir;

    fn ts(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 7, 18)
            .unwrap()
            .and_hms_opt(9, minute, 0)
            .unwrap()
    }

    fn fixture() -> (BarSeries, RsiSeries) {
        let closes = [100.0, 90.0, 95.0, 120.0, 118.0];
        let rsi_values = [None, Some(20.0), Some(45.0), Some(80.0), Some(55.0)];

        let bars: Vec<PriceBar> = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                timestamp: ts(i as u32),
                open: Some(close),
                high: Some(close + 1.0),
                low: Some(close - 1.0),
                close,
            })
            .collect();
        let points = bars
            .iter()
            .zip(rsi_values)
            .map(|(bar, value)| RsiPoint {
                timestamp: bar.timestamp,
                value,
            })
            .collect();
        let rsi = RsiSeries {
            period: 14,
            used_prior_session: true,
            insufficient_data: false,
            points,
        };
        let series = BarSeries::new(
            "226950".to_string(),
            NaiveDate::from_ymd_opt(2025, 7, 18).unwrap(),
            bars,
        );
        (series, rsi)
    }

    #[test]
    fn write_simulation_produces_readable_json() {
        let (series, rsi) = fixture();
        let params = SimulationParams {
            oversold: 30.0,
            overbought: 70.0,
            initial_capital: 10_000.0,
        };
        let result =
            run_simulation(&series, &rsi, &params, &ExecutionConfig::default()).unwrap();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sim").join("226950.json");
        JsonReportAdapter::new()
            .write_simulation(&result, &path)
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(doc["code"], "226950");
        assert_eq!(doc["params"]["oversold"], 30.0);
        assert!(doc["trades"].as_array().unwrap().len() >= 2);
        assert_eq!(
            doc["equity_curve"].as_array().unwrap().len(),
            series.len()
        );
    }

    #[test]
    fn write_grid_records_ranking_and_failures() {
        let (series, rsi) = fixture();
        let grid = ThresholdGrid {
            oversold: 25..=26,
            overbought: 74..=75,
        };
        let result = run_grid_search(
            &series,
            &rsi,
            &grid,
            10_000.0,
            &ExecutionConfig::default(),
        );

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("grid.json");
        JsonReportAdapter::new().write_grid(&result, &path).unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["succeeded"], 4);
        assert_eq!(doc["ranked"].as_array().unwrap().len(), 4);
        assert!(doc["failed"].as_array().unwrap().is_empty());
    }
}
