//! Summary statistics over RSI series and batches of simulation runs.

use serde::Serialize;

use super::rsi::RsiSeries;
use super::simulator::SimulationResult;

/// Conventional distribution marks, independent of the thresholds a
/// simulation actually trades on.
pub const OVERSOLD_MARK: f64 = 30.0;
pub const OVERBOUGHT_MARK: f64 = 70.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RsiDistribution {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub oversold_count: usize,
    pub overbought_count: usize,
    pub neutral_count: usize,
    pub valid_count: usize,
}

impl RsiDistribution {
    /// `None` when the series has no defined values.
    pub fn analyze(series: &RsiSeries) -> Option<Self> {
        let values = series.defined_values();
        if values.is_empty() {
            return None;
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        let mut sorted = values.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).expect("RSI values are finite"));
        let median = if sorted.len() % 2 == 1 {
            sorted[sorted.len() / 2]
        } else {
            (sorted[sorted.len() / 2 - 1] + sorted[sorted.len() / 2]) / 2.0
        };

        Some(RsiDistribution {
            min: sorted[0],
            max: *sorted.last().expect("non-empty"),
            mean,
            median,
            std_dev: variance.sqrt(),
            oversold_count: values.iter().filter(|&&v| v < OVERSOLD_MARK).count(),
            overbought_count: values.iter().filter(|&&v| v > OVERBOUGHT_MARK).count(),
            neutral_count: values
                .iter()
                .filter(|&&v| (OVERSOLD_MARK..=OVERBOUGHT_MARK).contains(&v))
                .count(),
            valid_count: values.len(),
        })
    }
}

/// Disjoint profit-rate bands (percent). `flat` separates the no-trade case
/// a threshold sweep frequently produces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfitBuckets {
    /// <= -5%
    pub steep_loss: usize,
    /// (-5%, 0)
    pub loss: usize,
    /// exactly 0
    pub flat: usize,
    /// (0, 5%]
    pub gain: usize,
    /// > 5%
    pub steep_gain: usize,
}

impl ProfitBuckets {
    fn add(&mut self, profit_rate: f64) {
        if profit_rate <= -5.0 {
            self.steep_loss += 1;
        } else if profit_rate < 0.0 {
            self.loss += 1;
        } else if profit_rate == 0.0 {
            self.flat += 1;
        } else if profit_rate <= 5.0 {
            self.gain += 1;
        } else {
            self.steep_gain += 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub runs: usize,
    pub min_profit_rate: f64,
    pub max_profit_rate: f64,
    pub mean_profit_rate: f64,
    pub buckets: ProfitBuckets,
}

impl BatchSummary {
    pub fn summarize(results: &[SimulationResult]) -> Self {
        let mut buckets = ProfitBuckets::default();
        for result in results {
            buckets.add(result.profit_rate);
        }

        let rates: Vec<f64> = results.iter().map(|r| r.profit_rate).collect();
        let (min, max, mean) = if rates.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            (
                rates.iter().copied().fold(f64::INFINITY, f64::min),
                rates.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                rates.iter().sum::<f64>() / rates.len() as f64,
            )
        };

        BatchSummary {
            runs: results.len(),
            min_profit_rate: min,
            max_profit_rate: max,
            mean_profit_rate: mean,
            buckets,
        }
    }
}
