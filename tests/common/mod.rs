#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use rsitrader::domain::bar::{BarSeries, PriceBar};
use rsitrader::domain::simulator::SimulationParams;
use std::fs;
use std::path::Path;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 10-minute bar timestamps starting at 09:00.
pub fn bar_time(session: NaiveDate, index: usize) -> NaiveDateTime {
    session.and_hms_opt(9, 0, 0).unwrap() + chrono::Duration::minutes(10 * index as i64)
}

pub fn series_from_closes(code: &str, session: NaiveDate, closes: &[f64]) -> BarSeries {
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            timestamp: bar_time(session, i),
            open: Some(close),
            high: Some(close + 1.0),
            low: Some(close - 1.0),
            close,
        })
        .collect();
    BarSeries::new(code, session, bars)
}

pub fn params(oversold: f64, overbought: f64, initial_capital: f64) -> SimulationParams {
    SimulationParams {
        oversold,
        overbought,
        initial_capital,
    }
}

/// Write a session file in the collector's layout:
/// `{base}/{YYYYMMDD}/stock_data_{code}_{YYYYMMDD}.json`.
pub fn write_session_file(base: &Path, code: &str, session: NaiveDate, closes: &[f64]) {
    let date_str = session.format("%Y%m%d").to_string();
    let dir = base.join(&date_str);
    fs::create_dir_all(&dir).unwrap();

    let rows: Vec<String> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            format!(
                r#"    {{"localDateTime": "{}", "currentPrice": {}, "openPrice": {}, "highPrice": {}, "lowPrice": {}}}"#,
                bar_time(session, i).format("%Y%m%d%H%M%S"),
                close,
                close,
                close + 1.0,
                close - 1.0
            )
        })
        .collect();

    let body = format!(
        "{{\n  \"stock_code\": \"{}\",\n  \"date\": \"{}\",\n  \"data\": [\n{}\n  ]\n}}\n",
        code,
        date_str,
        rows.join(",\n")
    );
    fs::write(
        dir.join(format!("stock_data_{}_{}.json", code, date_str)),
        body,
    )
    .unwrap();
}

/// Close sequence engineered to sweep RSI from 100 down through 0 and back
/// above 70: flat, five -5 steps, five +10 steps, then a drift.
pub fn dip_and_rally_closes() -> Vec<f64> {
    vec![
        100.0, 95.0, 90.0, 85.0, 80.0, 75.0, 85.0, 95.0, 105.0, 115.0, 125.0, 130.0, 128.0, 126.0,
    ]
}

/// A flat 20-bar warmup session: all deltas zero, so the smoothed averages
/// seed at zero and the first session delta dominates.
pub fn flat_warmup_closes() -> Vec<f64> {
    vec![100.0; 20]
}
