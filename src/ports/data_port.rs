//! Market data access port trait.

use crate::domain::error::VolsqueezeError;
use crate::domain::ohlcv::Bar;
use chrono::NaiveDate;

pub trait MarketDataPort {
    fn fetch(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Bar>, VolsqueezeError>;

    fn list_symbols(&self) -> Result<Vec<String>, VolsqueezeError>;
}
