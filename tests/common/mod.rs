#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
use volsqueeze::domain::error::VolsqueezeError;
use volsqueeze::domain::indicator::IndicatorRow;
pub use volsqueeze::domain::ohlcv::Bar;
use volsqueeze::ports::data_port::MarketDataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl MarketDataPort for MockDataPort {
    fn fetch(
        &self,
        symbol: &str,
        _start_date: NaiveDate,
        _end_date: NaiveDate,
    ) -> Result<Vec<Bar>, VolsqueezeError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(VolsqueezeError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, VolsqueezeError> {
        Ok(self.data.keys().cloned().collect())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(symbol: &str, date_str: &str, close: f64) -> Bar {
    Bar {
        symbol: symbol.to_string(),
        date: NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap(),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: Some(1000.0),
    }
}

pub fn generate_bars(symbol: &str, start_date: &str, count: usize, start_price: f64) -> Vec<Bar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    (0..count)
        .map(|i| Bar {
            symbol: symbol.to_string(),
            date: start + chrono::Duration::days(i as i64),
            open: start_price + i as f64,
            high: start_price + i as f64 + 1.0,
            low: start_price + i as f64 - 1.0,
            close: start_price + i as f64,
            volume: Some(1000.0),
        })
        .collect()
}

/// A fully-resolved indicator row with no signal set. Tests flip the
/// signal booleans they need.
pub fn make_row(date: NaiveDate, close: f64) -> IndicatorRow {
    IndicatorRow {
        date,
        close,
        volume: Some(1000.0),
        sma: Some(close),
        std_dev: Some(1.0),
        upper: Some(close + 2.0),
        lower: Some(close - 2.0),
        band_width: Some(4.0 / close),
        squeeze: false,
        bb_position: Some(0.5),
        rsi: Some(50.0),
        volume_ratio: Some(1.0),
        buy: false,
        sell_half: false,
        sell_all: false,
    }
}
