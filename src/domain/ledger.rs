//! Cash/shares ledger and the append-only trade log.
//!
//! One ledger is owned by one simulation run. No margin, no fractional
//! shares, no short positions: cash and shares never go negative.

use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeAction {
    Buy,
    Sell,
    /// Forced end-of-run liquidation at the last close.
    FinalSell,
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TradeAction::Buy => "BUY",
            TradeAction::Sell => "SELL",
            TradeAction::FinalSell => "FINAL_SELL",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub timestamp: NaiveDateTime,
    pub action: TradeAction,
    pub price: f64,
    pub shares: u64,
    pub cash_after: f64,
    pub shares_after: u64,
    /// RSI value that triggered the signal; a FINAL_SELL may carry none.
    pub rsi: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionLedger {
    pub cash: f64,
    pub shares: u64,
}

impl PositionLedger {
    pub fn new(initial_capital: f64) -> Self {
        PositionLedger {
            cash: initial_capital,
            shares: 0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.shares == 0
    }

    /// Buy as many whole shares as the cash affords at `price`. Returns the
    /// share count, 0 when nothing is affordable (ledger untouched).
    pub fn buy_max(&mut self, price: f64) -> u64 {
        if price <= 0.0 {
            return 0;
        }
        let shares = (self.cash / price).floor() as u64;
        if shares > 0 {
            self.cash -= shares as f64 * price;
            self.shares += shares;
        }
        shares
    }

    /// Liquidate the full position at `price`. Returns the shares sold.
    pub fn sell_all(&mut self, price: f64) -> u64 {
        let shares = self.shares;
        self.cash += shares as f64 * price;
        self.shares = 0;
        shares
    }

    /// Mark-to-market value at `price`.
    pub fn equity(&self, price: f64) -> f64 {
        self.cash + self.shares as f64 * price
    }
}
