//! Session data access port trait.

use chrono::NaiveDate;

use crate::domain::bar::BarSeries;
use crate::domain::error::RsitraderError;

/// How many calendar days back to look for the nearest prior trading
/// session (weekends and holidays leave gaps in the data).
pub const PRIOR_SESSION_LOOKBACK_DAYS: u32 = 7;

pub trait SessionDataPort {
    /// Bars for one instrument-session, ordered by timestamp.
    fn fetch_session(&self, code: &str, date: NaiveDate) -> Result<BarSeries, RsitraderError>;

    /// Nearest prior session within `max_lookback_days`, skipping days with
    /// no data. `Ok(None)` when nothing is found in the window.
    fn fetch_prior_session(
        &self,
        code: &str,
        date: NaiveDate,
        max_lookback_days: u32,
    ) -> Result<Option<BarSeries>, RsitraderError>;

    /// Instrument codes with data for the given session date.
    fn list_codes(&self, date: NaiveDate) -> Result<Vec<String>, RsitraderError>;
}
