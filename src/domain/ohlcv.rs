//! Daily OHLCV bar representation.

use chrono::NaiveDate;

/// One daily bar. Volume is optional: some data files omit the column,
/// which disables volume confirmation downstream rather than failing.
#[derive(Debug, Clone)]
pub struct Bar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
}

impl Bar {
    /// A close is usable when it is a finite, positive price.
    pub fn has_valid_close(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }
}
