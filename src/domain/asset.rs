//! Per-asset signal series with date index, and the shared timeline.

use crate::domain::indicator::IndicatorRow;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone)]
pub struct AssetSeries {
    pub symbol: String,
    pub rows: Vec<IndicatorRow>,
    pub date_index: HashMap<NaiveDate, usize>,
}

impl AssetSeries {
    pub fn new(symbol: String, rows: Vec<IndicatorRow>) -> Self {
        let date_index = rows
            .iter()
            .enumerate()
            .map(|(i, row)| (row.date, i))
            .collect();
        Self {
            symbol,
            rows,
            date_index,
        }
    }

    pub fn row_on(&self, date: NaiveDate) -> Option<&IndicatorRow> {
        self.date_index.get(&date).map(|&i| &self.rows[i])
    }
}

/// Dates present in EVERY asset, sorted ascending. The portfolio loop
/// only trades days the whole universe can price.
pub fn build_common_timeline(assets: &[AssetSeries]) -> Vec<NaiveDate> {
    let mut iter = assets.iter();
    let Some(first) = iter.next() else {
        return Vec::new();
    };
    let mut common: BTreeSet<NaiveDate> = first.rows.iter().map(|r| r.date).collect();
    for asset in iter {
        let dates: BTreeSet<NaiveDate> = asset.rows.iter().map(|r| r.date).collect();
        common = common.intersection(&dates).copied().collect();
    }
    common.into_iter().collect()
}
