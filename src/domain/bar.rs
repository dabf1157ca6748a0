//! Intraday price bar and session series representation.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One intraday price observation. The feed guarantees a traded price
/// (`close`) per sample; open/high/low may be absent on a given bar, in
/// which case the documented fallback is the bar's close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
}

/// One instrument-session worth of ordered bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    pub code: String,
    pub date: NaiveDate,
    pub bars: Vec<PriceBar>,
}

impl BarSeries {
    pub fn new(code: impl Into<String>, date: NaiveDate, bars: Vec<PriceBar>) -> Self {
        BarSeries {
            code: code.into(),
            date,
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Closing prices in bar order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Timestamps strictly increasing and all closes positive.
    pub fn is_well_formed(&self) -> bool {
        if self.bars.iter().any(|b| !(b.close > 0.0)) {
            return false;
        }
        self.bars
            .windows(2)
            .all(|w| w[0].timestamp < w[1].timestamp)
    }
}
