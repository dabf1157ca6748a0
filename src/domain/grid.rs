//! Brute-force (oversold, overbought) threshold grid search.
//!
//! Every cell is an independent simulator run over the same immutable bar
//! and RSI series with a fresh ledger, so cells are pure and reorderable.
//! Ranking is profit rate descending with grid iteration order (oversold
//! ascending, then overbought ascending) breaking ties; the sort is stable,
//! which makes the ranking deterministic however cells were executed.

use serde::Serialize;
use std::cmp::Ordering;
use std::ops::RangeInclusive;

use super::bar::BarSeries;
use super::execution::ExecutionConfig;
use super::rsi::RsiSeries;
use super::simulator::{run_simulation, SimulationParams, SimulationResult};

pub const DEFAULT_OVERSOLD_RANGE: RangeInclusive<u32> = 25..=35;
pub const DEFAULT_OVERBOUGHT_RANGE: RangeInclusive<u32> = 65..=75;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThresholdGrid {
    pub oversold: RangeInclusive<u32>,
    pub overbought: RangeInclusive<u32>,
}

impl Default for ThresholdGrid {
    fn default() -> Self {
        ThresholdGrid {
            oversold: DEFAULT_OVERSOLD_RANGE,
            overbought: DEFAULT_OVERBOUGHT_RANGE,
        }
    }
}

impl ThresholdGrid {
    /// Cells in grid iteration order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.oversold
            .clone()
            .flat_map(move |oversold| {
                self.overbought
                    .clone()
                    .map(move |overbought| (oversold, overbought))
            })
    }

    pub fn cell_count(&self) -> usize {
        self.cells().count()
    }
}

/// A grid cell whose run failed. The batch carries on regardless.
#[derive(Debug, Clone, Serialize)]
pub struct FailedCell {
    pub oversold: u32,
    pub overbought: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GridSearchResult {
    /// Profit rate descending, grid order on ties.
    pub ranked: Vec<SimulationResult>,
    pub succeeded: usize,
    pub failed: Vec<FailedCell>,
}

impl GridSearchResult {
    pub fn best(&self) -> Option<&SimulationResult> {
        self.ranked.first()
    }
}

pub fn run_grid_search(
    bars: &BarSeries,
    rsi: &RsiSeries,
    grid: &ThresholdGrid,
    initial_capital: f64,
    execution: &ExecutionConfig,
) -> GridSearchResult {
    let mut ranked = Vec::with_capacity(grid.cell_count());
    let mut failed = Vec::new();

    for (oversold, overbought) in grid.cells() {
        let params = SimulationParams {
            oversold: oversold as f64,
            overbought: overbought as f64,
            initial_capital,
        };
        match run_simulation(bars, rsi, &params, execution) {
            Ok(result) => ranked.push(result),
            Err(err) => failed.push(FailedCell {
                oversold,
                overbought,
                reason: err.to_string(),
            }),
        }
    }

    // stable sort over grid insertion order = deterministic tie-break
    ranked.sort_by(|a, b| {
        b.profit_rate
            .partial_cmp(&a.profit_rate)
            .unwrap_or(Ordering::Equal)
    });

    let succeeded = ranked.len();
    GridSearchResult {
        ranked,
        succeeded,
        failed,
    }
}
