//! CSV report adapter.
//!
//! Simulation reports become a trade log; grid reports become the ranked
//! threshold table. Flat rows only, spreadsheet-friendly.

use crate::domain::error::RsitraderError;
use crate::domain::grid::GridSearchResult;
use crate::domain::simulator::SimulationResult;
use crate::ports::report_port::ReportPort;
use std::fs;
use std::path::Path;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    fn open_writer(path: &Path) -> Result<csv::Writer<fs::File>, RsitraderError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        csv::Writer::from_path(path).map_err(|e| RsitraderError::Storage {
            reason: format!("failed to open {}: {}", path.display(), e),
        })
    }

    fn storage(e: csv::Error) -> RsitraderError {
        RsitraderError::Storage {
            reason: format!("CSV write error: {}", e),
        }
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_simulation(
        &self,
        result: &SimulationResult,
        output_path: &Path,
    ) -> Result<(), RsitraderError> {
        let mut wtr = Self::open_writer(output_path)?;
        wtr.write_record([
            "timestamp",
            "action",
            "price",
            "shares",
            "cash_after",
            "shares_after",
            "rsi",
        ])
        .map_err(Self::storage)?;

        for trade in &result.trades {
            let rsi = trade
                .rsi
                .map(|v| format!("{:.2}", v))
                .unwrap_or_default();
            wtr.write_record([
                trade.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                trade.action.to_string(),
                format!("{:.2}", trade.price),
                trade.shares.to_string(),
                format!("{:.2}", trade.cash_after),
                trade.shares_after.to_string(),
                rsi,
            ])
            .map_err(Self::storage)?;
        }

        wtr.flush()?;
        Ok(())
    }

    fn write_grid(
        &self,
        result: &GridSearchResult,
        output_path: &Path,
    ) -> Result<(), RsitraderError> {
        let mut wtr = Self::open_writer(output_path)?;
        wtr.write_record([
            "rank",
            "oversold",
            "overbought",
            "profit_rate",
            "profit",
            "buy_count",
            "sell_count",
            "avg_buy_price",
            "avg_sell_price",
            "max_gain_rate",
            "max_loss_rate",
        ])
        .map_err(Self::storage)?;

        for (rank, run) in result.ranked.iter().enumerate() {
            wtr.write_record([
                (rank + 1).to_string(),
                format!("{:.0}", run.params.oversold),
                format!("{:.0}", run.params.overbought),
                format!("{:.4}", run.profit_rate),
                format!("{:.2}", run.profit),
                run.buy_count.to_string(),
                run.sell_count.to_string(),
                format!("{:.2}", run.avg_buy_price),
                format!("{:.2}", run.avg_sell_price),
                format!("{:.4}", run.max_gain_rate),
                format!("{:.4}", run.max_loss_rate),
            ])
            .map_err(Self::storage)?;
        }

        wtr.flush()?;
        Ok(())
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
    fn simulation_report_is_a_trade_log() {
        let (series, rsi) = fixture();
        let params = SimulationParams {
            oversold: 30.0,
            overbought: 70.0,
            initial_capital: 10_000.0,
        };
        let result =
            run_simulation(&series, &rsi, &params, &ExecutionConfig::default()).unwrap();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trades.csv");
        CsvReportAdapter::new()
            .write_simulation(&result, &path)
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "timestamp,action,price,shares,cash_after,shares_after,rsi"
        );
        let first = lines.next().unwrap();
        assert!(first.contains("BUY"));
        assert!(content.lines().count() >= 3);
    }

    #[test]
    fn grid_report_ranks_from_one() {
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
        let path = dir.path().join("grid.csv");
        CsvReportAdapter::new().write_grid(&result, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 1 + 4);
        assert!(lines[0].starts_with("rank,oversold,overbought,profit_rate"));
        assert!(lines[1].starts_with("1,"));
        assert!(lines[4].starts_with("4,"));
    }
}
