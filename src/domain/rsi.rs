//! RSI (Relative Strength Index) engine with prior-session stitching.
//!
//! Wilder's smoothing over closing prices:
//! - First average: simple mean of gains/losses over the first P deltas
//! - Subsequent: avg = (prev_avg * (P-1) + current) / P
//! - RSI = 100 - (100 / (1 + avg_gain / avg_loss)); avg_loss == 0 => 100
//!
//! An intraday session alone gives the oscillator a cold start: the first P
//! bars have no defined value. Stitching the tail of the nearest prior
//! session in front of the current one moves the warm-up into yesterday, so
//! every current-session bar can carry a value. Only points for the current
//! session are returned, one per bar, in order.

use chrono::NaiveDateTime;
use serde::Serialize;

use super::bar::BarSeries;

pub const DEFAULT_PERIOD: usize = 14;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RsiPoint {
    pub timestamp: NaiveDateTime,
    /// `None` during warm-up; otherwise in [0, 100].
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RsiSeries {
    pub period: usize,
    pub used_prior_session: bool,
    /// Fewer than P+1 combined samples: every point is undefined and the
    /// caller should surface a diagnostic. Soft outcome, never an error.
    pub insufficient_data: bool,
    pub points: Vec<RsiPoint>,
}

impl RsiSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.points.get(index).and_then(|p| p.value)
    }

    /// Number of leading undefined points.
    pub fn warmup_len(&self) -> usize {
        self.points
            .iter()
            .take_while(|p| p.value.is_none())
            .count()
    }

    pub fn defined_values(&self) -> Vec<f64> {
        self.points.iter().filter_map(|p| p.value).collect()
    }
}

/// Compute RSI for `session`, optionally seeded with a prior session's
/// closes. The smoothing recurrence runs over the concatenated sequence;
/// only points aligned to `session` bars are returned.
pub fn compute_rsi(session: &BarSeries, prior: Option<&BarSeries>, period: usize) -> RsiSeries {
    let prefix: Vec<f64> = prior.map(|p| p.closes()).unwrap_or_default();
    let used_prior_session = !prefix.is_empty();

    let mut combined = prefix.clone();
    combined.extend(session.closes());

    if period == 0 || combined.len() < period + 1 {
        let points = session
            .bars
            .iter()
            .map(|b| RsiPoint {
                timestamp: b.timestamp,
                value: None,
            })
            .collect();
        return RsiSeries {
            period,
            used_prior_session,
            insufficient_data: true,
            points,
        };
    }

    let deltas: Vec<f64> = combined.windows(2).map(|w| w[1] - w[0]).collect();
    let gains: Vec<f64> = deltas.iter().map(|d| d.max(0.0)).collect();
    let losses: Vec<f64> = deltas.iter().map(|d| (-d).max(0.0)).collect();

    // values[c] is the RSI at combined index c; defined from c == period on.
    let mut values: Vec<Option<f64>> = vec![None; combined.len()];
    let mut avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period as f64;
    values[period] = Some(rsi_from_averages(avg_gain, avg_loss));

    for c in (period + 1)..combined.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[c - 1]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[c - 1]) / period as f64;
        values[c] = Some(rsi_from_averages(avg_gain, avg_loss));
    }

    let offset = prefix.len();
    let points = session
        .bars
        .iter()
        .enumerate()
        .map(|(k, b)| RsiPoint {
            timestamp: b.timestamp,
            value: values[offset + k],
        })
        .collect();

    RsiSeries {
        period,
        used_prior_session,
        insufficient_data: false,
        points,
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
