//! Bar-walk trading simulator.
//!
//! A single ordered pass over one session's bars, driven by RSI threshold
//! signals. Two observable states: FLAT (no shares) and HOLDING. A fulfilled
//! signal consumes its execution bar: the walk resumes on the bar after the
//! fill, so an execution bar never hosts a fresh signal. A run that ends
//! HOLDING is force-liquidated at the last close (FINAL_SELL), bypassing the
//! execution policy, so every result is settled in cash.

use chrono::NaiveDateTime;
use serde::Serialize;

use super::bar::BarSeries;
use super::error::RsitraderError;
use super::execution::{ExecutionConfig, Side};
use super::ledger::{PositionLedger, Trade, TradeAction};
use super::rsi::RsiSeries;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionState {
    Flat,
    Holding,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationParams {
    pub oversold: f64,
    pub overbought: f64,
    pub initial_capital: f64,
}

/// One equity-curve sample. Bars with undefined RSI still sample, carrying
/// the last known ledger state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub rsi: Option<f64>,
    pub cash: f64,
    pub shares: u64,
    pub equity: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub code: String,
    pub params: SimulationParams,
    pub execution: ExecutionConfig,
    pub final_cash: f64,
    pub final_shares: u64,
    pub profit: f64,
    /// Percent of initial capital.
    pub profit_rate: f64,
    pub buy_count: usize,
    /// SELL plus FINAL_SELL.
    pub sell_count: usize,
    pub avg_buy_price: f64,
    pub avg_sell_price: f64,
    pub max_equity: f64,
    pub min_equity: f64,
    pub max_gain_rate: f64,
    pub max_loss_rate: f64,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

/// Pure transition function: what the state machine does on a bar with the
/// given RSI. Undefined RSI never transitions.
pub fn signal(
    state: PositionState,
    rsi: Option<f64>,
    cash: f64,
    params: &SimulationParams,
) -> Option<Side> {
    let rsi = rsi?;
    match state {
        PositionState::Flat if rsi < params.oversold && cash > 0.0 => Some(Side::Buy),
        PositionState::Holding if rsi > params.overbought => Some(Side::Sell),
        _ => None,
    }
}

/// Walk the series once and settle the ledger.
///
/// Fails only for structural problems (empty series, RSI series not aligned
/// one-to-one with the bars); dropped signals and insufficient warm-up are
/// ordinary outcomes.
pub fn run_simulation(
    bars: &BarSeries,
    rsi: &RsiSeries,
    params: &SimulationParams,
    execution: &ExecutionConfig,
) -> Result<SimulationResult, RsitraderError> {
    if bars.is_empty() {
        return Err(RsitraderError::Data {
            context: format!("{} {}", bars.code, bars.date),
            reason: "empty bar series".into(),
        });
    }
    if rsi.len() != bars.len() {
        return Err(RsitraderError::Data {
            context: format!("{} {}", bars.code, bars.date),
            reason: format!(
                "RSI series has {} points for {} bars",
                rsi.len(),
                bars.len()
            ),
        });
    }

    let mut ledger = PositionLedger::new(params.initial_capital);
    let mut state = PositionState::Flat;
    let mut trades: Vec<Trade> = Vec::new();
    let mut equity_curve: Vec<EquityPoint> = Vec::new();

    let mut i = 0;
    while i < bars.len() {
        let rsi_value = rsi.value_at(i);

        let fill = signal(state, rsi_value, ledger.cash, params)
            .and_then(|side| execution.resolve(bars, i, side).map(|f| (side, f)));

        match fill {
            Some((Side::Buy, fill)) => {
                let shares = ledger.buy_max(fill.price);
                if shares > 0 {
                    state = PositionState::Holding;
                    trades.push(Trade {
                        timestamp: fill.timestamp,
                        action: TradeAction::Buy,
                        price: fill.price,
                        shares,
                        cash_after: ledger.cash,
                        shares_after: ledger.shares,
                        rsi: rsi_value,
                    });
                    record(&mut equity_curve, bars, rsi, fill.bar_index, &ledger);
                    i = fill.bar_index + 1;
                    continue;
                }
                // nothing affordable: no transition, walk on
            }
            Some((Side::Sell, fill)) => {
                let shares = ledger.sell_all(fill.price);
                state = PositionState::Flat;
                trades.push(Trade {
                    timestamp: fill.timestamp,
                    action: TradeAction::Sell,
                    price: fill.price,
                    shares,
                    cash_after: ledger.cash,
                    shares_after: 0,
                    rsi: rsi_value,
                });
                record(&mut equity_curve, bars, rsi, fill.bar_index, &ledger);
                i = fill.bar_index + 1;
                continue;
            }
            // no signal, or the signal was dropped at the series edge
            None => {}
        }

        record(&mut equity_curve, bars, rsi, i, &ledger);
        i += 1;
    }

    // Terminal rule: never leave the run holding shares.
    if state == PositionState::Holding {
        let last = bars.bars.last().expect("non-empty series");
        let shares = ledger.sell_all(last.close);
        trades.push(Trade {
            timestamp: last.timestamp,
            action: TradeAction::FinalSell,
            price: last.close,
            shares,
            cash_after: ledger.cash,
            shares_after: 0,
            rsi: rsi.value_at(bars.len() - 1),
        });
    }

    Ok(summarize(bars, params, execution, ledger, trades, equity_curve))
}

fn record(
    curve: &mut Vec<EquityPoint>,
    bars: &BarSeries,
    rsi: &RsiSeries,
    index: usize,
    ledger: &PositionLedger,
) {
    let bar = &bars.bars[index];
    curve.push(EquityPoint {
        timestamp: bar.timestamp,
        price: bar.close,
        rsi: rsi.value_at(index),
        cash: ledger.cash,
        shares: ledger.shares,
        equity: ledger.equity(bar.close),
    });
}

fn summarize(
    bars: &BarSeries,
    params: &SimulationParams,
    execution: &ExecutionConfig,
    ledger: PositionLedger,
    trades: Vec<Trade>,
    equity_curve: Vec<EquityPoint>,
) -> SimulationResult {
    let initial = params.initial_capital;
    let profit = ledger.cash - initial;
    let profit_rate = if initial > 0.0 {
        profit / initial * 100.0
    } else {
        0.0
    };

    let buy_prices: Vec<f64> = trades
        .iter()
        .filter(|t| t.action == TradeAction::Buy)
        .map(|t| t.price)
        .collect();
    let sell_prices: Vec<f64> = trades
        .iter()
        .filter(|t| t.action != TradeAction::Buy)
        .map(|t| t.price)
        .collect();

    let max_equity = equity_curve
        .iter()
        .map(|p| p.equity)
        .fold(initial, f64::max);
    let min_equity = equity_curve
        .iter()
        .map(|p| p.equity)
        .fold(initial, f64::min);

    SimulationResult {
        code: bars.code.clone(),
        params: params.clone(),
        execution: execution.clone(),
        final_cash: ledger.cash,
        final_shares: ledger.shares,
        profit,
        profit_rate,
        buy_count: buy_prices.len(),
        sell_count: sell_prices.len(),
        avg_buy_price: mean(&buy_prices),
        avg_sell_price: mean(&sell_prices),
        max_equity,
        min_equity,
        max_gain_rate: if initial > 0.0 {
            (max_equity - initial) / initial * 100.0
        } else {
            0.0
        },
        max_loss_rate: if initial > 0.0 {
            (min_equity - initial) / initial * 100.0
        } else {
            0.0
        },
        trades,
        equity_curve,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
