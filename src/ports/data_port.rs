//! Data access port trait.

use crate::domain::error::TrendsignalError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `code` on `exchange` within `[start_date, end_date]`, oldest first.
    fn fetch_ohlcv(
        &self,
        code: &str,
        exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, TrendsignalError>;

    fn list_symbols(&self, exchange: &str) -> Result<Vec<String>, TrendsignalError>;
}
