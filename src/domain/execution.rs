//! Signal execution policy: which bar, which price field, what slippage.
//!
//! A signal fires on bar `i`; the policy decides whether the fill happens on
//! bar `i` or `i + 1`, which OHLC field it transacts at, and applies
//! slippage multiplicatively (buys fill worse-high, sells worse-low). A
//! resolved index past the end of the series means no execution: the caller
//! drops the signal rather than deferring it.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::bar::{BarSeries, PriceBar};
use super::error::RsitraderError;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceField {
    Open,
    Close,
    High,
    Low,
}

impl PriceField {
    /// Configured field of a bar. Falls back to the bar's close when the
    /// feed omitted the field; the close is always present.
    pub fn price_of(&self, bar: &PriceBar) -> f64 {
        match self {
            PriceField::Open => bar.open.unwrap_or(bar.close),
            PriceField::Close => bar.close,
            PriceField::High => bar.high.unwrap_or(bar.close),
            PriceField::Low => bar.low.unwrap_or(bar.close),
        }
    }
}

impl FromStr for PriceField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(PriceField::Open),
            "close" => Ok(PriceField::Close),
            "high" => Ok(PriceField::High),
            "low" => Ok(PriceField::Low),
            other => Err(format!("unknown price field '{}'", other)),
        }
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PriceField::Open => "open",
            PriceField::Close => "close",
            PriceField::High => "high",
            PriceField::Low => "low",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionTiming {
    /// Fill on the signal bar itself.
    Current,
    /// Fill on the bar after the signal bar.
    Next,
}

impl FromStr for ExecutionTiming {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "current" => Ok(ExecutionTiming::Current),
            "next" => Ok(ExecutionTiming::Next),
            other => Err(format!("unknown execution timing '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

/// A resolved execution: the bar it lands on and the slippage-adjusted price.
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub bar_index: usize,
    pub timestamp: NaiveDateTime,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionConfig {
    pub buy_price_field: PriceField,
    pub sell_price_field: PriceField,
    pub buy_timing: ExecutionTiming,
    pub sell_timing: ExecutionTiming,
    /// Adverse fractional price adjustment, e.g. 0.002 = 20 bps.
    pub slippage: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            buy_price_field: PriceField::Open,
            sell_price_field: PriceField::Close,
            buy_timing: ExecutionTiming::Next,
            sell_timing: ExecutionTiming::Next,
            slippage: 0.0,
        }
    }
}

impl ExecutionConfig {
    /// Build from a `[trade]` config section, keeping defaults for absent
    /// keys and rejecting unrecognized values.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, RsitraderError> {
        let defaults = ExecutionConfig::default();

        let buy_price_field = parse_key(config, "buy_price_type", defaults.buy_price_field)?;
        let sell_price_field = parse_key(config, "sell_price_type", defaults.sell_price_field)?;
        let buy_timing = parse_key(config, "buy_execution_timing", defaults.buy_timing)?;
        let sell_timing = parse_key(config, "sell_execution_timing", defaults.sell_timing)?;

        let slippage = config.get_f64("trade", "slippage", defaults.slippage);
        if slippage < 0.0 || !slippage.is_finite() {
            return Err(RsitraderError::ConfigInvalid {
                section: "trade".into(),
                key: "slippage".into(),
                reason: format!("must be a non-negative fraction, got {}", slippage),
            });
        }

        Ok(ExecutionConfig {
            buy_price_field,
            sell_price_field,
            buy_timing,
            sell_timing,
            slippage,
        })
    }

    /// Resolve a signal on `signal_index` into a fill, or `None` when the
    /// execution bar falls outside the series.
    pub fn resolve(&self, bars: &BarSeries, signal_index: usize, side: Side) -> Option<Fill> {
        let (timing, field) = match side {
            Side::Buy => (self.buy_timing, self.buy_price_field),
            Side::Sell => (self.sell_timing, self.sell_price_field),
        };

        let bar_index = match timing {
            ExecutionTiming::Current => signal_index,
            ExecutionTiming::Next => signal_index + 1,
        };
        let bar = bars.bars.get(bar_index)?;

        let raw = field.price_of(bar);
        let price = match side {
            Side::Buy => raw * (1.0 + self.slippage),
            Side::Sell => raw * (1.0 - self.slippage),
        };

        Some(Fill {
            bar_index,
            timestamp: bar.timestamp,
            price,
        })
    }
}

fn parse_key<T>(config: &dyn ConfigPort, key: &str, default: T) -> Result<T, RsitraderError>
where
    T: FromStr<Err = String>,
{
    match config.get_str("trade", key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|reason| RsitraderError::ConfigInvalid {
            section: "trade".into(),
            key: key.into(),
            reason,
        }),
    }
}
