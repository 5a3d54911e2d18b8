//! CSV result export adapter.

use crate::domain::error::VolsqueezeError;
use crate::domain::simulator::{EquityPoint, Trade};
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct TradeRecord<'a> {
    date: String,
    symbol: &'a str,
    action: String,
    price: f64,
    shares: f64,
    notional: f64,
}

#[derive(Serialize)]
struct EquityRecord {
    date: String,
    cash: f64,
    position_value: f64,
    total: f64,
}

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_trades(&self, trades: &[Trade], path: &Path) -> Result<(), VolsqueezeError> {
        let mut writer = csv::Writer::from_path(path)?;
        for trade in trades {
            writer.serialize(TradeRecord {
                date: trade.date.format("%Y-%m-%d").to_string(),
                symbol: &trade.symbol,
                action: trade.action.to_string(),
                price: trade.price,
                shares: trade.shares,
                notional: trade.notional,
            })?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_equity(&self, curve: &[EquityPoint], path: &Path) -> Result<(), VolsqueezeError> {
        let mut writer = csv::Writer::from_path(path)?;
        for point in curve {
            writer.serialize(EquityRecord {
                date: point.date.format("%Y-%m-%d").to_string(),
                cash: point.cash,
                position_value: point.position_value,
                total: point.total,
            })?;
        }
        writer.flush()?;
        Ok(())
    }
}
